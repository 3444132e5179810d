//! Route paths.

pub const GET_HEALTH: &str = "/api/health";
pub const POST_TODOLIST: &str = "/api/todolist";
/// `GET` shows the list, `DELETE` removes it.
pub const TODOLIST_BY_HASH: &str = "/api/todolist/{hash}";
pub const POST_TODOLIST_INVITE: &str = "/api/todolist/{hash}/invite";
pub const POST_ITEMS: &str = "/api/todolist/{hash}/items";
pub const PUT_ITEMS_ORDER: &str = "/api/todolist/{hash}/items/order";
pub const DELETE_ITEM: &str = "/api/todolist/{hash}/items/{item_id}";
pub const PUT_ITEM_TOGGLE_STATUS: &str = "/api/todolist/{hash}/items/{item_id}/toggle-status";
pub const PUT_ITEM_CHANGE_DEADLINE: &str = "/api/todolist/{hash}/items/{item_id}/change-deadline";
