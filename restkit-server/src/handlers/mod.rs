pub mod dbversion;
pub mod health;
pub mod mailer;
pub mod queues;
