pub mod link;

pub use link::{
    timestamp, ClickEvent, CreateUrlRequest, CreateUrlResponse, CreatedLink, LinkRecord,
    LinkStats, UNKNOWN,
};
