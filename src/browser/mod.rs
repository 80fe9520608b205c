pub mod headless;
pub mod session;

pub use headless::launch_browser;
pub use session::{ChromeSessionFactory, Session, SessionFactory};
