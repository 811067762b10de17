pub mod default;
pub mod global_404;
pub mod notification;
pub mod ping;
pub mod upload;

pub use default::default_route_handler;
pub use global_404::global_404_handler;
pub use ping::ping_handler;

pub use notification::send::send_noti_handler;
pub use notification::send_batch::send_batch_noti_handler;

pub use upload::image::upload_image_handler;
