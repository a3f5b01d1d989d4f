//! Coin tips between profiles.

use crate::model::enums::NotificationType;
use crate::model::post::PostId;
use crate::model::profile::ProfileId;
use crate::model::tip::{NewTip, Tip};
use crate::repo::notification_repo::NotificationRepository;
use crate::repo::profile_repo::ProfileRepository;
use crate::repo::tip_repo::TipRepository;
use crate::repo::wallet_repo::WalletRepository;
use crate::service::{notify_activity, ServiceResult};
use log::info;

pub struct TipService<R> {
    repo: R,
}

impl<R> TipService<R>
where
    R: WalletRepository + TipRepository + ProfileRepository + NotificationRepository,
{
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Moves `amount` coins to `receiver` and notifies them.
    pub fn send_tip(
        &self,
        viewer: ProfileId,
        receiver: ProfileId,
        amount: i64,
        post_id: Option<PostId>,
        message: Option<&str>,
    ) -> ServiceResult<Tip> {
        let tip = self.repo.send_tip(&NewTip {
            sender_id: viewer,
            receiver_id: receiver,
            post_id,
            amount,
            message: message.map(str::to_string),
        })?;
        notify_activity(&self.repo, receiver, viewer, NotificationType::Tip, post_id);
        info!(
            "event=tip_send module=service status=ok tip_id={} amount={}",
            tip.id, tip.amount
        );
        Ok(tip)
    }

    pub fn received(&self, viewer: ProfileId) -> ServiceResult<Vec<Tip>> {
        Ok(self.repo.list_tips_received(viewer)?)
    }

    pub fn sent(&self, viewer: ProfileId) -> ServiceResult<Vec<Tip>> {
        Ok(self.repo.list_tips_sent(viewer)?)
    }
}
