//! Workbench client: the backend over HTTP, job polling, configuration,
//! uploads, exports, and the async chat presenter.
mod backend;
mod chat;
mod config_store;
mod csrf;
mod dimensions;
mod error;
mod export;
mod persist;
mod poller;
mod presenter;
mod sink;
mod types;
mod upload;
mod wire;

pub use backend::{Backend, BackendReply, BackendRequest, BackendSettings, ReqwestBackend};
pub use chat::{generate_session_id, ChatReply, ChatSession};
pub use config_store::ConfigStore;
pub use csrf::{parse_cookie, CookieAccessor, CSRF_COOKIE, CSRF_HEADER};
pub use dimensions::DimensionService;
pub use error::{ConfigError, DimensionError, JobError, PersistError, SendError, UploadError};
pub use export::{export_file_name, save_export, transcript_file_name, ExportClient};
pub use persist::{ensure_output_dir, AtomicFileWriter};
pub use poller::{AsyncJobPoller, JobHandle, PollSettings};
pub use presenter::{PresenterSettings, RevealOutcome, TypewriterPresenter};
pub use sink::{ChannelProgressSink, NullSink, ProgressSink};
pub use types::{BackendError, FailureKind, JobEvent};
pub use upload::FileUploader;
