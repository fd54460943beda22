mod admin;
mod cart;
mod health_check;
mod products;
mod waitlist;

pub use admin::{list_subscribers, remove_subscriber, waitlist_stats};
pub use cart::{add_cart_item, get_cart, remove_cart_item};
pub use health_check::health_check;
pub use products::{create_product, get_product, list_products};
pub use waitlist::{join_waitlist, waitlist_status};
