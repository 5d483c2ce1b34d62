pub mod client;
pub mod console;
pub mod error;
pub mod practice;
pub mod scripted;
pub mod setup;
pub mod speech;
pub mod timing;
pub mod transcript;

pub use error::{FlowError, ServiceError};
pub use practice::{PracticeContext, PracticeFlow, PracticeStatus};
pub use setup::{SetupContext, SetupFlow, SetupStatus};
pub use speech::{SpeechIo, SpeechRecognizer, SpeechSynthesizer};
pub use timing::FlowTimings;
