//! Out-of-band delivery contracts for guest links.

// self
use crate::{
	_prelude::*,
	auth::{CallerId, SubjectId},
};

/// Boxed future returned by [`LinkNotifier::deliver`].
pub type NotifyFuture<'a> = Pin<Box<dyn Future<Output = Result<(), NotifierError>> + 'a + Send>>;

/// Channel (email, chat, SMS) that hands a freshly minted guest link to its recipient.
pub trait LinkNotifier
where
	Self: Send + Sync,
{
	/// Delivers the link described by `delivery`. The link embeds a live token.
	fn deliver<'a>(&'a self, delivery: &'a LinkDelivery) -> NotifyFuture<'a>;
}

/// Payload handed to a [`LinkNotifier`].
#[derive(Clone)]
pub struct LinkDelivery {
	/// Caller who requested the link.
	pub caller: CallerId,
	/// Subject the link unlocks.
	pub subject: SubjectId,
	/// Guest link carrying the token.
	pub link: Url,
	/// Instant after which the link stops working.
	pub expires_at: OffsetDateTime,
}
impl Debug for LinkDelivery {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LinkDelivery")
			.field("caller", &self.caller)
			.field("subject", &self.subject)
			.field("link", &"<redacted>")
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Failure raised by a notification channel.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("{message}")]
pub struct NotifierError {
	/// Human-readable error payload.
	pub message: String,
}

/// Notifier that records deliveries in memory instead of sending them.
#[derive(Debug, Default)]
pub struct OutboxNotifier(Mutex<Vec<LinkDelivery>>);
impl OutboxNotifier {
	/// Drains and returns every recorded delivery.
	pub fn drain(&self) -> Vec<LinkDelivery> {
		std::mem::take(&mut *self.0.lock())
	}
}
impl LinkNotifier for OutboxNotifier {
	fn deliver<'a>(&'a self, delivery: &'a LinkDelivery) -> NotifyFuture<'a> {
		Box::pin(async move {
			self.0.lock().push(delivery.clone());

			Ok(())
		})
	}
}
