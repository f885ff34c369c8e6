//! Screen-level view models built on [`ViewModel`](crate::view_model::ViewModel).

pub mod cart;
pub mod conversations;
pub mod notifications;
pub mod products;

pub use cart::CartViewModel;
pub use conversations::ConversationsViewModel;
pub use notifications::NotificationsViewModel;
pub use products::ProductListViewModel;
