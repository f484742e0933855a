use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};

use crate::errors::{BookingError, PricingError, ValidationError};
use crate::models::{BookingRequest, BookingStatus, ConfirmedBooking};
use crate::services::catalog::CatalogProvider;
use crate::services::identity::IdentityProvider;
use crate::services::pricing;
use crate::services::receipt;
use crate::services::store::BookingStore;
use crate::services::validation::{self, MobileProfile};

/// Where a single submission currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeState {
    Selecting,
    /// Waiting on devotee details; carries the reason of the last rejection.
    DetailsPending { rejection: Option<String> },
    Validating,
    Pricing,
    Confirming,
    Confirmed,
}

impl IntakeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntakeState::Selecting => "selecting",
            IntakeState::DetailsPending { .. } => "details_pending",
            IntakeState::Validating => "validating",
            IntakeState::Pricing => "pricing",
            IntakeState::Confirming => "confirming",
            IntakeState::Confirmed => "confirmed",
        }
    }

    pub fn can_advance_to(&self, next: &IntakeState) -> bool {
        use IntakeState::*;
        matches!(
            (self, next),
            (Selecting, DetailsPending { rejection: None })
                | (DetailsPending { .. }, Validating)
                | (Validating, DetailsPending { rejection: Some(_) })
                | (Validating, Pricing)
                | (Pricing, DetailsPending { rejection: Some(_) })
                | (Pricing, Confirming)
                | (Confirming, Confirmed)
        )
    }
}

/// The states one submission passed through, oldest first.
#[derive(Debug)]
pub struct Submission {
    trail: Vec<IntakeState>,
}

impl Submission {
    fn new() -> Self {
        Self {
            trail: vec![IntakeState::Selecting],
        }
    }

    pub fn state(&self) -> &IntakeState {
        // Never empty: starts with Selecting and only grows.
        &self.trail[self.trail.len() - 1]
    }

    pub fn trail(&self) -> &[IntakeState] {
        &self.trail
    }

    fn advance(&mut self, next: IntakeState) {
        debug_assert!(
            self.state().can_advance_to(&next),
            "illegal intake transition {:?} -> {:?}",
            self.state(),
            next
        );
        tracing::debug!(from = self.state().as_str(), to = next.as_str(), "intake transition");
        self.trail.push(next);
    }

    fn reject(&mut self, reason: String) {
        self.advance(IntakeState::DetailsPending {
            rejection: Some(reason),
        });
    }
}

pub struct SubmissionOutcome {
    pub trail: Vec<IntakeState>,
    pub result: Result<ConfirmedBooking, BookingError>,
}

/// Turns a booking request into a confirmed, priced and recorded booking.
///
/// Catalog lookup and the final save are the only awaited steps. Success is
/// reported only after the store has acknowledged the write.
pub struct IntakeService {
    catalog: Arc<dyn CatalogProvider>,
    store: Arc<dyn BookingStore>,
    mobile_profile: MobileProfile,
    offset: FixedOffset,
    clock: fn() -> DateTime<Utc>,
}

/// Indian Standard Time, UTC+05:30.
const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

impl IntakeService {
    pub fn new(catalog: Arc<dyn CatalogProvider>, store: Arc<dyn BookingStore>) -> Self {
        Self {
            catalog,
            store,
            mobile_profile: MobileProfile::default(),
            offset: FixedOffset::east_opt(IST_OFFSET_SECS).unwrap_or_else(|| Utc.fix()),
            clock: Utc::now,
        }
    }

    pub fn with_mobile_profile(mut self, profile: MobileProfile) -> Self {
        self.mobile_profile = profile;
        self
    }

    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Calendar date at the temple right now.
    pub fn today(&self) -> NaiveDate {
        (self.clock)().with_timezone(&self.offset).date_naive()
    }

    pub async fn submit(
        &self,
        identity: &dyn IdentityProvider,
        request: BookingRequest,
    ) -> Result<ConfirmedBooking, BookingError> {
        self.run(identity, request).await.result
    }

    /// Same as [`submit`](Self::submit) but also returns the state trail.
    pub async fn run(&self, identity: &dyn IdentityProvider, request: BookingRequest) -> SubmissionOutcome {
        let mut submission = Submission::new();
        let result = self.drive(&mut submission, identity, request).await;

        if let Err(e) = &result {
            tracing::warn!(
                error = %e,
                state = submission.state().as_str(),
                "booking submission rejected"
            );
        }

        SubmissionOutcome {
            trail: submission.trail,
            result,
        }
    }

    async fn drive(
        &self,
        submission: &mut Submission,
        identity: &dyn IdentityProvider,
        request: BookingRequest,
    ) -> Result<ConfirmedBooking, BookingError> {
        let user = identity
            .current_user()
            .await
            .ok_or(BookingError::Unauthenticated)?;

        check_selection(&request, self.today())?;
        submission.advance(IntakeState::DetailsPending { rejection: None });

        submission.advance(IntakeState::Validating);
        if let Err(e) = validation::validate_requester_details(
            &request.requester,
            request.category,
            request.requester.anonymous,
            self.mobile_profile,
        ) {
            submission.reject(e.to_string());
            return Err(e.into());
        }

        submission.advance(IntakeState::Pricing);
        let entry = match self
            .catalog
            .lookup(request.category, request.offering_id.trim())
            .await
        {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                let err = PricingError::UnknownOffering(request.offering_id.clone());
                submission.reject(err.to_string());
                return Err(err.into());
            }
            Err(e) => {
                tracing::error!(error = %e, offering_id = %request.offering_id, "catalog lookup failed");
                submission.reject("catalog unavailable".to_string());
                return Err(BookingError::CatalogUnavailable(e));
            }
        };

        let time_slot = request
            .time_slot
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        if let Some(slot) = &time_slot {
            if !entry.accepts_slot(slot) {
                let err = ValidationError::new(
                    "time_slot",
                    format!("{slot} is not offered for {}", entry.display_name),
                );
                submission.reject(err.to_string());
                return Err(err.into());
            }
        }

        let total_amount = match pricing::compute_amount(
            &entry,
            request.quantity,
            request.donation_amount.as_ref(),
        ) {
            Ok(amount) => amount,
            Err(e) => {
                submission.reject(e.to_string());
                return Err(e.into());
            }
        };

        submission.advance(IntakeState::Confirming);
        let id = receipt::new_booking_id();
        let booking = ConfirmedBooking {
            receipt_number: receipt::receipt_number_for(&id),
            id,
            user_id: user.id,
            category: request.category,
            offering_id: entry.id,
            offering_name: entry.display_name,
            date: request.date,
            time_slot,
            quantity: request.quantity,
            requester: validation::normalize_requester_details(&request.requester, request.category),
            donation_amount: request.donation_amount,
            total_amount,
            status: BookingStatus::Confirmed,
            created_at: (self.clock)(),
        };

        if let Err(e) = self.store.save(&booking).await {
            tracing::error!(
                error = %e,
                booking_id = %booking.id,
                user_id = %booking.user_id,
                "failed to record booking"
            );
            return Err(BookingError::PersistenceFailed(e));
        }

        submission.advance(IntakeState::Confirmed);
        tracing::info!(
            booking_id = %booking.id,
            receipt = %booking.receipt_number,
            user_id = %booking.user_id,
            category = booking.category.as_str(),
            total_amount = booking.total_amount,
            "booking confirmed"
        );
        Ok(booking)
    }
}

/// Checks that move a submission out of `Selecting`.
pub fn check_selection(request: &BookingRequest, today: NaiveDate) -> Result<(), ValidationError> {
    if request.offering_id.trim().is_empty() {
        return Err(ValidationError::new("offering_id", "select an offering"));
    }

    if request.date <= today {
        return Err(ValidationError::new(
            "date",
            "booking date must be after today",
        ));
    }

    let has_slot = request
        .time_slot
        .as_deref()
        .is_some_and(|s| !s.trim().is_empty());
    if request.category.requires_time_slot() && !has_slot {
        return Err(ValidationError::new(
            "time_slot",
            format!("a time slot is required for {}", request.category.as_str()),
        ));
    }
    if !request.category.allows_time_slot() && has_slot {
        return Err(ValidationError::new(
            "time_slot",
            "donations do not take a time slot",
        ));
    }

    let cap = request.category.quantity_cap();
    if request.quantity < 1 || request.quantity > cap {
        return Err(ValidationError::new(
            "quantity",
            format!("quantity must be between 1 and {cap}"),
        ));
    }

    Ok(())
}
