//! # rcover
//!
//! Generate book cover art from a list of titles. For each title a text
//! model writes several cover descriptions, an image model renders each
//! description, and the results are written to
//! `<output>/<Title_With_Underscores>/cover_<n>.png` next to
//! `description_<n>.txt`.
//!
//! ```no_run
//! use rcover::{Config, CoverPipeline, GenerationConfig, Providers};
//!
//! # async fn run() -> rcover::Result<()> {
//! let config = Config::from_env()?;
//! let providers = Providers::connect(&config).await?;
//! let pipeline = CoverPipeline::from_config(providers, &config);
//!
//! let report = pipeline
//!     .run(&GenerationConfig::new().with_titles(["The Great Escape"]).with_variations(2))
//!     .await?;
//! for warning in &report.warnings {
//!     eprintln!("{}", warning);
//! }
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod pipeline;
pub mod present;
pub mod providers;
pub mod session;
pub mod throttle;

pub use config::{BedrockConfig, Config, OpenAiConfig, ProviderKind};
pub use error::{CoverError, GenerationFailure, Result, Stage};
pub use models::*;
pub use pipeline::{CoverPipeline, RunReport};
pub use providers::{ImageGenerator, Providers, TextGenerator};
pub use session::{RunHandler, Session};
pub use throttle::{FixedDelay, Throttle};
