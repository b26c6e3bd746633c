//! Workbench core: data model, result rendering, the chat message pipeline,
//! the reveal algorithm and the pure state machine of the processing screen.
mod chat;
mod config;
mod content;
mod effect;
mod error;
mod msg;
pub mod pipeline;
mod result;
pub mod reveal;
mod state;
mod types;
mod update;
mod view_model;

pub use chat::{
    prepare_outgoing, service_greeting, ChatLog, ChatMessage, Role, CLEARED_GREETING,
    WELCOME_GREETING,
};
pub use config::{ServiceConfig, ServiceConfigWire, ServiceKind};
pub use content::{ContentNode, ContentTree, Element, MathNode};
pub use effect::Effect;
pub use error::{MalformedResultError, ValidationError};
pub use msg::Msg;
pub use pipeline::MessagePipeline;
pub use result::{
    export, export_document, render, ExportMetadata, ProcessedResult, Record, TableRow,
    TabularView, TABLE_COLUMNS,
};
pub use state::{AppState, JobPhase};
pub use types::{
    CompletedJob, Dimension, DimensionCatalog, DimensionId, JobKind, JobStatus, JobSubmission,
    Notification, NotificationLevel, TokenUsage, DEFAULT_MAX_TOKENS,
};
pub use update::update;
pub use view_model::{AppViewModel, DimensionRow};
