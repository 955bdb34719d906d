pub mod email;

pub use email::{EmailNotifier, Notifier};
