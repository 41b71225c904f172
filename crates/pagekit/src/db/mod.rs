mod service;

pub use service::PageService;
