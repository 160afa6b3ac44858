mod dataset;
mod error;
mod load;
mod record;
mod referral;
pub mod server;
mod transition;

pub use dataset::{Dataset, DatasetBuilder, ReduceFn, Stats};
pub use error::{LoadError, ServeError};
pub use load::{load_actions, load_users, read_input};
pub use record::{Action, REFER_USER, User};
pub use referral::ReferralGraph;
pub use server::{ServerConfig, router, serve};
pub use transition::TransitionCounts;
