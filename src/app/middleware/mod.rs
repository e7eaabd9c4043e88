pub mod di;
pub mod to2;

pub use di::DiMiddleware;
pub use to2::To2Middleware;
