mod matcher;
mod route;

pub use matcher::Matcher;
pub use route::*;
