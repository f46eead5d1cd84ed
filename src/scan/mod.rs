pub mod pool;
pub mod probe;
pub mod spider;
pub mod url;
pub mod vhost;
pub mod visited;

pub use self::url::{UrlJob, UrlResult, UrlScanner};
pub use self::vhost::{VhostResult, VhostScanner};
