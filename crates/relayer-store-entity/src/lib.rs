pub mod batch_messages;
pub mod batches;
pub mod listener_cursors;
pub mod messages;
pub mod processed_messages;
pub mod signatures;

pub use batch_messages::Entity as BatchMessages;
pub use batches::Entity as Batches;
pub use listener_cursors::Entity as ListenerCursors;
pub use messages::Entity as Messages;
pub use processed_messages::Entity as ProcessedMessages;
pub use signatures::Entity as Signatures;
