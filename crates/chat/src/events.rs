//! Named events shared between the domain service, the gateway, and
//! clients.

// Server -> client
pub const CONNECTED: &str = "connected";
pub const NEW_CHAT: &str = "newChat";
pub const MESSAGE_RECEIVED: &str = "messageReceived";
pub const UPDATE_GROUP_NAME: &str = "updateGroupName";
pub const LEAVE_CHAT: &str = "leaveChat";
pub const SOCKET_ERROR: &str = "socketError";

// Client -> server (typing flows back out to the chat-room verbatim)
pub const JOIN_CHAT: &str = "joinChat";
pub const TYPING: &str = "typing";
pub const STOP_TYPING: &str = "stopTyping";
