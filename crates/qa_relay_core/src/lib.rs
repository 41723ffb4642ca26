pub mod domain;
pub mod notify;
pub mod ports;

pub use domain::{
    Channel, EventPayload, Identity, NewQuestion, NotificationEvent, Question, User,
    UserCredentials,
};
pub use notify::{AnswerNotifier, DeliveryReport, FailedPublish, NotifyCommand};
pub use ports::{DatabaseService, PortError, PortResult, RealtimeRelay, SessionTokenService};
