// Staff Administration - admin-managed staff records and access codes

use crate::application::authz::require_admin;
use crate::application::constants::MAX_ACCESS_CODE_ATTEMPTS;
use crate::domain::{
    AccessCode, ChangeEvent, ChangeKind, Queue, Session, StaffId, StaffMember, StaffProfile,
};
use crate::error::{AppError, Result};
use crate::port::{
    AccessCodeGenerator, ChangePublisher, IdProvider, QueueRepository, StaffRepository,
    TimeProvider,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Draw codes until one is free (and differs from `previous`, if given).
///
/// The store's UNIQUE constraint still guards against a concurrent writer
/// claiming the same code between this check and the write.
pub async fn generate_unique_code(
    staff_repo: &dyn StaffRepository,
    generator: &dyn AccessCodeGenerator,
    previous: Option<&AccessCode>,
) -> Result<AccessCode> {
    for attempt in 1..=MAX_ACCESS_CODE_ATTEMPTS {
        let candidate = generator.generate();

        if previous == Some(&candidate) {
            continue;
        }
        if staff_repo.access_code_exists(&candidate).await? {
            warn!(attempt = attempt, "Access code collision, retrying");
            continue;
        }
        return Ok(candidate);
    }

    Err(AppError::Internal(format!(
        "could not generate a free access code after {} attempts",
        MAX_ACCESS_CODE_ATTEMPTS
    )))
}

/// Staff Administration Service
pub struct StaffAdminService {
    staff_repo: Arc<dyn StaffRepository>,
    queue_repo: Arc<dyn QueueRepository>,
    code_generator: Arc<dyn AccessCodeGenerator>,
    publisher: Arc<dyn ChangePublisher>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
}

impl StaffAdminService {
    pub fn new(
        staff_repo: Arc<dyn StaffRepository>,
        queue_repo: Arc<dyn QueueRepository>,
        code_generator: Arc<dyn AccessCodeGenerator>,
        publisher: Arc<dyn ChangePublisher>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            staff_repo,
            queue_repo,
            code_generator,
            publisher,
            id_provider,
            time_provider,
        }
    }

    /// Create a staff member together with their (open) queue
    pub async fn create(&self, session: &Session, profile: StaffProfile) -> Result<StaffMember> {
        let admin = require_admin(session)?;
        let profile = profile.normalized()?;

        let code =
            generate_unique_code(self.staff_repo.as_ref(), self.code_generator.as_ref(), None)
                .await?;

        let now = self.time_provider.now_millis();
        let staff = StaffMember::new(self.id_provider.generate_id(), now, profile, code);
        let queue = Queue::new(self.id_provider.generate_id(), staff.id.clone(), now);

        self.staff_repo.insert_with_queue(&staff, &queue).await?;

        info!(
            staff_id = %staff.id,
            queue_id = %queue.id,
            admin = %admin.user_id,
            "Staff member created"
        );
        self.publisher
            .publish(ChangeEvent::staff(ChangeKind::Insert, &staff.id, now));
        self.publisher
            .publish(ChangeEvent::queue(ChangeKind::Insert, &queue.id, now));

        Ok(staff)
    }

    /// Edit name/email/department
    pub async fn update(
        &self,
        session: &Session,
        staff_id: &StaffId,
        profile: StaffProfile,
    ) -> Result<StaffMember> {
        require_admin(session)?;
        let profile = profile.normalized()?;

        let staff = self.staff_repo.update_profile(staff_id, &profile).await?;

        self.publisher.publish(ChangeEvent::staff(
            ChangeKind::Update,
            &staff.id,
            self.time_provider.now_millis(),
        ));
        Ok(staff)
    }

    /// Delete a staff member; their queue and entries go with them
    pub async fn delete(&self, session: &Session, staff_id: &StaffId) -> Result<()> {
        let admin = require_admin(session)?;

        let queue = self.queue_repo.find_by_staff(staff_id).await?;
        if !self.staff_repo.delete(staff_id).await? {
            return Err(AppError::NotFound(format!("Staff {} not found", staff_id)));
        }

        info!(staff_id = %staff_id, admin = %admin.user_id, "Staff member deleted");

        let now = self.time_provider.now_millis();
        self.publisher
            .publish(ChangeEvent::staff(ChangeKind::Delete, staff_id, now));
        if let Some(queue) = queue {
            self.publisher
                .publish(ChangeEvent::queue(ChangeKind::Delete, &queue.id, now));
        }
        Ok(())
    }

    /// Issue a new access code. The old one stops working immediately.
    pub async fn regenerate_code(
        &self,
        session: &Session,
        staff_id: &StaffId,
    ) -> Result<StaffMember> {
        require_admin(session)?;

        let mut staff = self
            .staff_repo
            .find_by_id(staff_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Staff {} not found", staff_id)))?;

        let code = generate_unique_code(
            self.staff_repo.as_ref(),
            self.code_generator.as_ref(),
            Some(&staff.access_code),
        )
        .await?;

        self.staff_repo.update_access_code(staff_id, &code).await?;
        staff.access_code = code;

        info!(staff_id = %staff_id, "Access code regenerated");
        self.publisher.publish(ChangeEvent::staff(
            ChangeKind::Update,
            staff_id,
            self.time_provider.now_millis(),
        ));
        Ok(staff)
    }

    /// All staff members, access codes included
    pub async fn list(&self, session: &Session) -> Result<Vec<StaffMember>> {
        require_admin(session)?;
        self.staff_repo.list().await
    }
}
