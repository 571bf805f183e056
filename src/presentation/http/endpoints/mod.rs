pub mod dispatch;
pub mod feedback;
pub mod health;
pub mod root;
pub mod settings;
