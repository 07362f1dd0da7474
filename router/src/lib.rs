#![forbid(unsafe_code)]

//! Path routing for sprig.
//!
//! A [`Router`] maps `:name` patterns to handlers, evaluates route guards,
//! writes browser history through a [`WindowLike`](sprig_dom::WindowLike),
//! and reports each navigation as a [`RouterEvent`].
//!
//! ```
//! use sprig_router::{params_map, Router, RouteOptions};
//!
//! let router = Router::<&'static str>::new();
//! router.map("/user/:id", "user", RouteOptions::new()).unwrap();
//! assert_eq!(router.resolve("/user/5").as_deref(), Some("/user/:id"));
//! assert_eq!(
//!     router
//!         .generate_url("/user/:id", &params_map!("id" => "5"))
//!         .unwrap()
//!         .as_deref(),
//!     Some("/user/5")
//! );
//! ```

mod error;
mod event;
pub mod location;
mod matching;
pub mod params;
mod router;

pub use error::*;
pub use event::RouterEvent;
pub use matching::*;
pub use params::ParamsMap;
pub use router::*;
pub use sprig_dom::NavigationEventKind;
