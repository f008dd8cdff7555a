// Session checks shared by every service

use crate::domain::{AdminIdentity, Queue, Session};
use crate::error::{AppError, Result};

/// Admin-only operations
pub fn require_admin(session: &Session) -> Result<&AdminIdentity> {
    match session {
        Session::Admin(identity) => Ok(identity),
        Session::Staff(_) => Err(AppError::Forbidden("admin access required".to_string())),
        Session::Anonymous => Err(AppError::Unauthorized("login required".to_string())),
    }
}

/// Any logged-in identity
pub fn require_authenticated(session: &Session) -> Result<()> {
    if session.is_anonymous() {
        return Err(AppError::Unauthorized("login required".to_string()));
    }
    Ok(())
}

/// Staff may act on their own queue only; admins on any queue
pub fn authorize_queue(session: &Session, queue: &Queue) -> Result<()> {
    match session {
        Session::Admin(_) => Ok(()),
        Session::Staff(identity) if identity.staff_id == queue.staff_id => Ok(()),
        Session::Staff(identity) => {
            tracing::warn!(
                staff_id = %identity.staff_id,
                queue_id = %queue.id,
                "Staff attempted to act on another staff member's queue"
            );
            Err(AppError::Forbidden(format!(
                "queue {} belongs to another staff member",
                queue.id
            )))
        }
        Session::Anonymous => Err(AppError::Unauthorized("login required".to_string())),
    }
}
