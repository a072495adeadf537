//! Product reviews.

use chrono::{DateTime, Utc};
use common::{OrderId, ProductId, ReviewId, UserId};
use serde::{Deserialize, Serialize};

/// Moderation status of a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ReviewStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReviewStatus::Pending),
            "approved" => Ok(ReviewStatus::Approved),
            "rejected" => Ok(ReviewStatus::Rejected),
            other => Err(format!("unknown review status: {other}")),
        }
    }
}

/// An image attached to a review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewImage {
    pub url: String,
    pub caption: Option<String>,
}

/// Helpful-vote tally. The count always equals the size of the user set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HelpfulVotes {
    pub count: u32,
    pub users: Vec<UserId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewMetadata {
    pub edited: bool,
    pub last_edited_at: Option<DateTime<Utc>>,
    pub moderated_at: Option<DateTime<Utc>>,
    pub moderated_by: Option<UserId>,
    pub purchase_date: Option<DateTime<Utc>>,
    pub device_info: Option<String>,
}

/// Fields a review author may change. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewEdit {
    pub rating: Option<u8>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub pros: Option<Vec<String>>,
    pub cons: Option<Vec<String>>,
    pub images: Option<Vec<ReviewImage>>,
}

/// A verified-purchase review of a product.
///
/// At most one review exists per (user, product) pair; the store enforces
/// this with a unique index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub user: UserId,
    pub product: ProductId,
    /// The delivered order proving the purchase.
    pub order: OrderId,
    /// 1-5 stars; out-of-range input is clamped.
    pub rating: u8,
    pub title: String,
    pub content: String,
    pub images: Vec<ReviewImage>,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub verified: bool,
    pub helpful: HelpfulVotes,
    pub status: ReviewStatus,
    pub admin_comment: Option<String>,
    pub metadata: ReviewMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Review {
    /// Creates a pending, verified review against a delivered order.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user: UserId,
        product: ProductId,
        order: OrderId,
        rating: u8,
        title: String,
        content: String,
        purchase_date: Option<DateTime<Utc>>,
        device_info: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ReviewId::new(),
            user,
            product,
            order,
            rating: rating.clamp(1, 5),
            title,
            content,
            images: Vec::new(),
            pros: Vec::new(),
            cons: Vec::new(),
            verified: true,
            helpful: HelpfulVotes::default(),
            status: ReviewStatus::Pending,
            admin_comment: None,
            metadata: ReviewMetadata {
                purchase_date,
                device_info,
                ..ReviewMetadata::default()
            },
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies an author edit. Edited reviews drop back to `pending` for
    /// re-moderation.
    pub fn edit(&mut self, edit: ReviewEdit) {
        if let Some(rating) = edit.rating {
            self.rating = rating.clamp(1, 5);
        }
        if let Some(title) = edit.title {
            self.title = title;
        }
        if let Some(content) = edit.content {
            self.content = content;
        }
        if let Some(pros) = edit.pros {
            self.pros = pros;
        }
        if let Some(cons) = edit.cons {
            self.cons = cons;
        }
        if let Some(images) = edit.images {
            self.images = images;
        }

        let now = Utc::now();
        self.metadata.edited = true;
        self.metadata.last_edited_at = Some(now);
        self.status = ReviewStatus::Pending;
        self.updated_at = now;
    }

    /// Applies a moderation decision.
    pub fn moderate(
        &mut self,
        status: ReviewStatus,
        admin_comment: Option<String>,
        moderator: UserId,
    ) {
        let now = Utc::now();
        self.status = status;
        if admin_comment.is_some() {
            self.admin_comment = admin_comment;
        }
        self.metadata.moderated_at = Some(now);
        self.metadata.moderated_by = Some(moderator);
        self.updated_at = now;
    }

    /// Toggles a user's helpful vote. Returns true if the vote is now set.
    pub fn toggle_helpful(&mut self, user: UserId) -> bool {
        match self.helpful.users.iter().position(|u| *u == user) {
            Some(index) => {
                self.helpful.users.remove(index);
                self.helpful.count = self.helpful.count.saturating_sub(1);
                false
            }
            None => {
                self.helpful.users.push(user);
                self.helpful.count += 1;
                true
            }
        }
    }

    pub fn is_approved(&self) -> bool {
        self.status == ReviewStatus::Approved
    }
}
