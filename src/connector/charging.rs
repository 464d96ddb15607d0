use super::Connector;
use crate::error::{EvseError, Result, ResumeError};
use crate::session::SessionSnapshot;
use crate::types::{ChargePointErrorCode, ChargePointStatus, Reason};
use chrono::{DateTime, Utc};

impl Connector {
    /// Start charging if the connector is available (or already preparing)
    /// and the session accepts the ids.
    ///
    /// The relay is only switched on once the session has started. Failing
    /// to arm the sampling job is logged and does not affect the session.
    pub fn start_charging(&self, transaction_id: &str, tag_id: &str) -> Result<()> {
        let _transition = self.transition.lock();
        let logger = self.logger.for_transaction(transaction_id);

        {
            let mut state = self.state.lock();
            if !matches!(
                state.status,
                ChargePointStatus::Available | ChargePointStatus::Preparing
            ) {
                return Err(EvseError::invalid_state("start charging", state.status));
            }
            state.status = ChargePointStatus::Preparing;
            state.error_code = ChargePointErrorCode::NoError;
            self.publish(&state);
        }

        {
            let mut slot = self.session.lock();
            if let Err(e) = slot.session.start(transaction_id, tag_id) {
                logger.warn(&format!("Session rejected: {}", e));
                return Err(e);
            }
            slot.delivered = 0;
        }

        self.relay.enable();
        self.commit_relay_on(
            transaction_id,
            "start charging",
            Some(ChargePointStatus::Charging),
        )?;
        self.persist_session(&self.session_snapshot());

        logger.info(&format!("Started charging, tag {}", tag_id));

        if self.metering_enabled()
            && let Err(e) = self.arm_sampling()
        {
            logger.warn(&format!("Cannot sample connector: {}", e));
        }

        Ok(())
    }

    /// Restore a session that was active before a reboot.
    ///
    /// Returns the minutes already charged. Every failure carries an elapsed
    /// value equal to the charging cap, telling the caller to stop now. The
    /// prior transaction id is recorded even on failure so the transaction
    /// can still be stopped upstream.
    pub fn resume_charging(
        &self,
        prior: &SessionSnapshot,
    ) -> std::result::Result<i64, ResumeError> {
        let _transition = self.transition.lock();
        let logger = self.logger.for_transaction(&prior.transaction_id);
        let max_minutes = i64::from(self.max_charging_time);
        let fail = |error: EvseError| ResumeError::new(error, max_minutes);

        {
            let mut slot = self.session.lock();
            if !slot.session.is_active() {
                slot.session.set_transaction_id(&prior.transaction_id);
            }
        }

        let started = DateTime::parse_from_rfc3339(&prior.started)
            .map_err(|e| fail(e.into()))?
            .with_timezone(&Utc);

        let elapsed = (Utc::now() - started).num_minutes().max(0);
        if elapsed >= max_minutes {
            logger.warn(&format!(
                "Session ran {} minutes, cap is {}",
                elapsed, max_minutes
            ));
            return Err(fail(EvseError::time_limit_exceeded(elapsed, max_minutes)));
        }

        let status = self.status();
        if !status.is_session_bearing() {
            return Err(fail(EvseError::invalid_state("resume charging", status)));
        }

        {
            let mut slot = self.session.lock();
            slot.session
                .start(&prior.transaction_id, &prior.tag_id)
                .map_err(fail)?;
            slot.session.restore(started, &prior.consumption);
            // values recorded before the reboot were already reported
            let restored = slot.session.consumption().len();
            slot.delivered = restored;
        }

        self.relay.enable();
        self.commit_relay_on(&prior.transaction_id, "resume charging", None)
            .map_err(fail)?;
        self.persist_session(&self.session_snapshot());

        if self.metering_enabled()
            && let Err(e) = self.arm_sampling()
        {
            logger.warn(&format!("Cannot sample connector: {}", e));
        }

        logger.info(&format!("Resumed after {} minutes", elapsed));
        Ok(elapsed)
    }

    /// Confirm, after the relay was switched on, that the session started by
    /// the current transition is still the live one and the status still
    /// allows it. A nested stop or status change made while the relay was
    /// switching is honoured: the relay goes back off, a session still open
    /// is closed and the transition fails.
    ///
    /// With `next` set, the connector must still be `Preparing` and moves to
    /// `next` under the same guard; otherwise any session-bearing status is
    /// kept as is.
    fn commit_relay_on(
        &self,
        transaction_id: &str,
        operation: &str,
        next: Option<ChargePointStatus>,
    ) -> Result<()> {
        let session_intact = {
            let slot = self.session.lock();
            slot.session.is_active() && slot.session.transaction_id() == transaction_id
        };

        let status = {
            let mut state = self.state.lock();
            let status_intact = match next {
                Some(_) => state.status == ChargePointStatus::Preparing,
                None => state.status.is_session_bearing(),
            };
            if session_intact && status_intact {
                if let Some(status) = next {
                    state.status = status;
                    state.error_code = ChargePointErrorCode::NoError;
                    self.publish(&state);
                }
                return Ok(());
            }
            state.status
        };

        self.relay.disable();
        if session_intact {
            let snapshot = {
                let mut slot = self.session.lock();
                slot.session.end();
                slot.session.snapshot()
            };
            self.persist_session(&snapshot);
        }

        self.logger.for_transaction(transaction_id).warn(&format!(
            "Connector changed to {} while switching the relay on, aborting {}",
            status, operation
        ));
        Err(EvseError::invalid_state(operation, status))
    }

    /// Stop charging: end the session, switch the relay off and move to the
    /// status implied by `reason`.
    ///
    /// `EVDisconnected` leads to `SuspendedEVSE`, `UnlockCommand` to
    /// `Unavailable`; anything else passes through `Finishing` to `Available`
    /// with a notification for each.
    pub fn stop_charging(&self, reason: Reason) -> Result<()> {
        let _transition = self.transition.lock();
        if !self.status().is_session_bearing() {
            return Err(EvseError::NotCharging);
        }

        let (transaction_id, snapshot) = {
            let mut slot = self.session.lock();
            let transaction_id = slot.session.transaction_id().to_string();
            slot.session.end();
            (transaction_id, slot.session.snapshot())
        };

        self.relay.disable();
        self.scheduler.cancel(self.job_key());
        self.persist_session(&snapshot);

        match reason {
            Reason::EvDisconnected => {
                self.set_status(
                    ChargePointStatus::SuspendedEvse,
                    ChargePointErrorCode::NoError,
                );
            }
            Reason::UnlockCommand => {
                self.set_status(ChargePointStatus::Unavailable, ChargePointErrorCode::NoError);
            }
            _ => {
                self.set_status(ChargePointStatus::Finishing, ChargePointErrorCode::NoError);
                self.set_status(ChargePointStatus::Available, ChargePointErrorCode::NoError);
            }
        }

        self.logger
            .for_transaction(&transaction_id)
            .info(&format!("Stopped charging, reason {:?}", reason));
        Ok(())
    }
}
