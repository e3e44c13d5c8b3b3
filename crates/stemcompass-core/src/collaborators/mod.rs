pub mod backend;
pub mod static_bank;
pub mod traits;

pub use backend::BackendClient;
pub use static_bank::StaticQuestionSource;
pub use traits::{
    AccountCollaborator, AnalysisCollaborator, DiscardingRecorder, QuestionSource,
    ResponseRecorder,
};
