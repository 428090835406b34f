use std::sync::Arc;
use chrono::{Duration, NaiveDate, NaiveTime, Utc};

use crate::availability;
use crate::ledger::FallbackLedger;
use crate::models::{
    Booking, BookingDraft, BookingOrigin, BookingStatus, MentorProfile, PaymentConfig,
    PaymentStatus, UserIdentity,
};
use crate::payments::config::CheckoutRequest;
use crate::payments::{PaymentError, PaymentProvider};
use crate::store::{BookingStore, StoreError};

pub const DEFAULT_SESSION_MINUTES: i32 = 30;

// Срок на оплату неоплаченной pending-брони
const PAYMENT_HOLD_MINUTES: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    SelectingDate,
    SelectingTime,
    EnteringDetails,
    Routing,
    AwaitingPayment,
    Confirmed,
    PendingManualFollowUp,
    Cancelled,
}

impl FlowState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FlowState::Confirmed | FlowState::PendingManualFollowUp | FlowState::Cancelled
        )
    }
}

/// Ошибки ввода. Показываются пользователю на месте и не доходят до сети.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    MissingDate,
    MissingTime,
    SlotNotOffered,
    MissingTopic,
    SubmissionInFlight,
    FlowClosed,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            ValidationError::MissingDate => "Выберите дату сессии",
            ValidationError::MissingTime => "Выберите время сессии",
            ValidationError::SlotNotOffered => "Это время недоступно у наставника",
            ValidationError::MissingTopic => "Опишите тему сессии",
            ValidationError::SubmissionInFlight => "Заявка уже отправляется, подождите",
            ValidationError::FlowClosed => "Бронирование уже завершено",
        };
        write!(f, "{}", text)
    }
}

impl std::error::Error for ValidationError {}

/// Ровно одно терминальное событие на прогон мастера.
#[derive(Debug, Clone)]
pub enum FlowOutcome {
    Confirmed(Booking),
    PendingFollowUp(Booking),
    Cancelled,
}

impl FlowOutcome {
    pub fn user_message(&self) -> String {
        match self {
            FlowOutcome::Confirmed(booking) => format!(
                "✅ Сессия забронирована на {}. Тема: {}.",
                booking.starts_at.format("%d.%m.%Y %H:%M"),
                booking.topic
            ),
            FlowOutcome::PendingFollowUp(_) => {
                "⏳ Заявка принята. Мы свяжемся с вами, чтобы завершить оплату.".to_string()
            }
            FlowOutcome::Cancelled => "Бронирование отменено.".to_string(),
        }
    }
}

/// Мастер бронирования одной сессии: явный конечный автомат вместо
/// последовательности экранов. Владеет черновиком на время одного прогона;
/// любой сбой хранилища или оплаты заканчивается терминальным событием,
/// а не ошибкой наверх.
pub struct BookingFlow {
    mentor: MentorProfile,
    requester: Option<UserIdentity>,
    config: PaymentConfig,
    store: Arc<dyn BookingStore>,
    payments: Arc<dyn PaymentProvider>,
    ledger: FallbackLedger,
    draft: BookingDraft,
    state: FlowState,
    in_flight: bool,
}

impl BookingFlow {
    pub fn new(
        mentor: MentorProfile,
        requester: Option<UserIdentity>,
        config: PaymentConfig,
        store: Arc<dyn BookingStore>,
        payments: Arc<dyn PaymentProvider>,
        ledger: FallbackLedger,
    ) -> Self {
        let draft = BookingDraft::new(&mentor.id);
        BookingFlow {
            mentor,
            requester,
            config,
            store,
            payments,
            ledger,
            draft,
            state: FlowState::SelectingDate,
            in_flight: false,
        }
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    fn ensure_open(&self) -> Result<(), ValidationError> {
        if self.in_flight || self.state == FlowState::AwaitingPayment {
            return Err(ValidationError::SubmissionInFlight);
        }
        if self.state.is_terminal() {
            return Err(ValidationError::FlowClosed);
        }
        Ok(())
    }

    /// Повторный выбор даты сбрасывает выбранное время.
    pub fn select_date(&mut self, date: NaiveDate) -> Result<(), ValidationError> {
        self.ensure_open()?;
        self.draft.date = Some(date);
        self.draft.time = None;
        self.state = FlowState::SelectingTime;
        Ok(())
    }

    pub fn select_time(&mut self, time: NaiveTime) -> Result<(), ValidationError> {
        self.ensure_open()?;
        let date = self.draft.date.ok_or(ValidationError::MissingDate)?;

        let slots = availability::slots_for(&self.mentor, date);
        if !slots.contains(&time) {
            return Err(ValidationError::SlotNotOffered);
        }

        self.draft.time = Some(time);
        self.state = FlowState::EnteringDetails;
        Ok(())
    }

    pub fn enter_details(
        &mut self,
        topic: &str,
        notes: Option<&str>,
    ) -> Result<(), ValidationError> {
        self.ensure_open()?;
        if self.draft.time.is_none() {
            return Err(ValidationError::MissingTime);
        }

        let topic = topic.trim();
        if topic.is_empty() {
            return Err(ValidationError::MissingTopic);
        }

        self.draft.topic = topic.to_string();
        self.draft.notes = notes
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        self.state = FlowState::Routing;
        Ok(())
    }

    /// Отмена бесплатна до начала оплаты и не пишет ничего никуда.
    pub fn cancel(&mut self) -> Result<FlowOutcome, ValidationError> {
        self.ensure_open()?;
        self.draft = BookingDraft::new(&self.mentor.id);
        Ok(self.finish(FlowOutcome::Cancelled))
    }

    /// Прогоняет маршрутизацию и оплату до терминального события.
    /// Повторный вызов во время выполнения отклоняется.
    pub async fn submit(&mut self) -> Result<FlowOutcome, ValidationError> {
        match self.state {
            FlowState::Routing => {}
            FlowState::SelectingDate => return Err(ValidationError::MissingDate),
            FlowState::SelectingTime => return Err(ValidationError::MissingTime),
            FlowState::EnteringDetails => return Err(ValidationError::MissingTopic),
            FlowState::AwaitingPayment => return Err(ValidationError::SubmissionInFlight),
            _ => return Err(ValidationError::FlowClosed),
        }
        if self.in_flight {
            return Err(ValidationError::SubmissionInFlight);
        }

        let start = match self.draft.resolved_start() {
            Some(start) => start,
            None => return Err(ValidationError::MissingDate),
        };

        self.in_flight = true;
        let outcome = self.route(start).await;
        self.in_flight = false;
        Ok(outcome)
    }

    async fn route(&mut self, start: chrono::DateTime<Utc>) -> FlowOutcome {
        let free = self.mentor.is_free();

        // Гостевой путь: без identity основное хранилище не используем вовсе.
        let requester = match self.requester.clone() {
            Some(user) => user,
            None => {
                log::info!("👤 Guest booking for mentor {}, recording locally", self.mentor.id);
                let booking = self.base_booking(
                    start,
                    None,
                    BookingStatus::Confirmed,
                    if free {
                        PaymentStatus::NotRequired
                    } else {
                        PaymentStatus::Pending
                    },
                    None,
                );
                return self.finish_local(booking).await;
            }
        };

        let mut booking = self.base_booking(
            start,
            Some(requester.id.clone()),
            BookingStatus::Pending,
            if free {
                PaymentStatus::NotRequired
            } else {
                PaymentStatus::Pending
            },
            if free {
                None
            } else {
                Some(Utc::now() + Duration::minutes(PAYMENT_HOLD_MINUTES))
            },
        );

        // Единственная попытка durable-записи за прогон: при отказе уходим
        // в локальный журнал, повторных записей нет.
        match self.store.create_pending(&booking).await {
            Ok(id) => booking.id = id,
            Err(StoreError::SchemaMissing) => {
                log::error!("❗ Booking schema missing, treating store as unavailable");
                booking.status = BookingStatus::Confirmed;
                return self.finish_local(booking).await;
            }
            Err(StoreError::Unreachable(e)) => {
                log::warn!("Booking store unreachable, falling back to local ledger: {}", e);
                booking.status = BookingStatus::Confirmed;
                return self.finish_local(booking).await;
            }
            Err(StoreError::Rejected(reason)) => {
                log::warn!("❌ Booking rejected by store: {}", reason);
                booking.status = BookingStatus::Pending;
                booking.payment_status = PaymentStatus::Failed;
                let id = self.ledger.record(booking.clone()).await;
                booking.id = id;
                booking.origin = BookingOrigin::Fallback;
                return self.finish(FlowOutcome::PendingFollowUp(booking));
            }
        }

        if free {
            return match self.store.mark_confirmed(&booking.id).await {
                Ok(()) => {
                    booking.status = BookingStatus::Confirmed;
                    self.finish(FlowOutcome::Confirmed(booking))
                }
                Err(e) => {
                    log::error!("Could not confirm free booking {}: {}", booking.id, e);
                    self.finish(FlowOutcome::PendingFollowUp(booking))
                }
            };
        }

        // Pending-запись подтверждена хранилищем, только теперь стартует оплата.
        self.state = FlowState::AwaitingPayment;

        let request = CheckoutRequest {
            booking_id: booking.id.clone(),
            amount: self.mentor.session_price(DEFAULT_SESSION_MINUTES),
            currency: self.config.currency.clone(),
            payer_contact: requester.payer_contact(),
        };

        match self.payments.charge(request).await {
            Ok(receipt) => match self.store.mark_paid(&booking.id).await {
                Ok(()) => {
                    booking.status = BookingStatus::Confirmed;
                    booking.payment_status = PaymentStatus::Paid;
                    booking.expires_at = None;
                    self.finish(FlowOutcome::Confirmed(booking))
                }
                Err(e) => {
                    log::error!(
                        "Charge {} succeeded but booking {} update failed: {}",
                        receipt.reference,
                        booking.id,
                        e
                    );
                    self.absorb_payment_failure(booking).await
                }
            },
            Err(PaymentError::Declined(reason)) => {
                log::warn!("❌ Payment declined for booking {}: {}", booking.id, reason);
                self.absorb_payment_failure(booking).await
            }
            Err(PaymentError::Indeterminate(reason)) => {
                log::warn!(
                    "⚠️ Payment outcome unknown for booking {}: {}",
                    booking.id,
                    reason
                );
                self.absorb_payment_failure(booking).await
            }
        }
    }

    /// Точка поглощения платёжных сбоев: запись остается pending/failed
    /// (durable, если получилось, иначе локально), пользователь получает
    /// обещание ручного продолжения. Наверх ничего не бросаем.
    async fn absorb_payment_failure(&mut self, mut booking: Booking) -> FlowOutcome {
        booking.status = BookingStatus::Pending;
        booking.payment_status = PaymentStatus::Failed;
        booking.expires_at = None;

        if let Err(e) = self.store.mark_failed(&booking.id).await {
            log::warn!("Could not mark booking {} failed: {}", booking.id, e);
            let id = self.ledger.record(booking.clone()).await;
            booking.id = id;
            booking.origin = BookingOrigin::Fallback;
        }

        self.finish(FlowOutcome::PendingFollowUp(booking))
    }

    async fn finish_local(&mut self, mut booking: Booking) -> FlowOutcome {
        let id = self.ledger.record(booking.clone()).await;
        booking.id = id;
        booking.origin = BookingOrigin::Fallback;
        self.finish(FlowOutcome::Confirmed(booking))
    }

    fn finish(&mut self, outcome: FlowOutcome) -> FlowOutcome {
        self.state = match &outcome {
            FlowOutcome::Confirmed(_) => FlowState::Confirmed,
            FlowOutcome::PendingFollowUp(_) => FlowState::PendingManualFollowUp,
            FlowOutcome::Cancelled => FlowState::Cancelled,
        };
        // Одно уведомление на терминальное состояние
        log::info!("📣 {}", outcome.user_message());
        outcome
    }

    fn base_booking(
        &self,
        starts_at: chrono::DateTime<Utc>,
        requester_id: Option<String>,
        status: BookingStatus,
        payment_status: PaymentStatus,
        expires_at: Option<chrono::DateTime<Utc>>,
    ) -> Booking {
        Booking {
            id: String::new(),
            mentor_id: self.mentor.id.clone(),
            requester_id,
            starts_at,
            duration_minutes: DEFAULT_SESSION_MINUTES,
            topic: self.draft.topic.clone(),
            notes: self.draft.notes.clone(),
            status,
            payment_status,
            origin: BookingOrigin::Durable,
            created_at: Utc::now(),
            expires_at,
        }
    }
}
