pub mod api;
pub mod bot;
pub mod config;
pub mod error;
pub mod format;
pub mod types;

pub use api::FixrClient;
pub use bot::{first_available_event, first_available_ticket, CycleReport, TicketBot};
pub use config::{BotConfig, CartCredentials};
pub use error::{BotError, Result};
pub use types::{Event, EventId, Ticket, Venue};
