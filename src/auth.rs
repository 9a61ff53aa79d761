use std::collections::HashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use crate::session::Role;
use crate::table::Row;

pub const MAX_ATTEMPTS: u32 = 3;
pub const LOCKOUT_PERIOD: Duration = Duration::from_secs(60);

/// One row of the user store: (identifier, secret, role), columns 0-2.
#[derive(Clone, Debug)]
pub struct CredentialRecord {
    pub username: String,
    pub password: String,
    pub role: Role,
}

impl CredentialRecord {
    /// Parse user-store rows (header already discarded). Rows shorter than
    /// three columns or with a blank role cannot authorize anyone and are
    /// skipped, which leaves their credentials indistinguishable from unknown
    /// ones.
    pub fn from_rows(rows: &[Row]) -> Vec<CredentialRecord> {
        rows.iter()
            .filter(|row| row.len() >= 3 && !row[2].trim().is_empty())
            .map(|row| CredentialRecord {
                username: row[0].clone(),
                password: row[1].clone(),
                role: Role::new(&row[2]),
            })
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoginOutcome {
    Authorized(Role),
    Rejected(Rejection),
}

/// Unknown identifier and wrong secret are indistinguishable on purpose:
/// both surface as `InvalidCredentials`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rejection {
    InvalidCredentials { remaining_attempts: u32 },
    LockedOut { retry_after: Duration },
}

/// Attempt/lockout bookkeeping behind a trait so a persistent store could be
/// swapped in without touching the login algorithm.
pub trait AttemptStore {
    fn failures(&self, addr: IpAddr) -> u32;
    fn record_failure(&mut self, addr: IpAddr) -> u32;
    fn lockout_expiry(&self, addr: IpAddr) -> Option<Instant>;
    fn set_lockout(&mut self, addr: IpAddr, until: Instant);
    /// Drop both the counter and any lockout entry for the address.
    fn clear(&mut self, addr: IpAddr);
}

#[derive(Default)]
pub struct MemoryAttemptStore {
    attempts: HashMap<IpAddr, u32>,
    lockouts: HashMap<IpAddr, Instant>,
}

impl AttemptStore for MemoryAttemptStore {
    fn failures(&self, addr: IpAddr) -> u32 {
        self.attempts.get(&addr).copied().unwrap_or(0)
    }

    fn record_failure(&mut self, addr: IpAddr) -> u32 {
        let count = self.attempts.entry(addr).or_insert(0);
        *count += 1;
        *count
    }

    fn lockout_expiry(&self, addr: IpAddr) -> Option<Instant> {
        self.lockouts.get(&addr).copied()
    }

    fn set_lockout(&mut self, addr: IpAddr, until: Instant) {
        self.lockouts.insert(addr, until);
    }

    fn clear(&mut self, addr: IpAddr) {
        self.attempts.remove(&addr);
        self.lockouts.remove(&addr);
    }
}

/// Validates credentials against the read-only user store and enforces the
/// per-address lockout policy. Credential records are loaded once at startup
/// and never mutated here.
pub struct Authenticator<S = MemoryAttemptStore> {
    records: Vec<CredentialRecord>,
    store: S,
}

impl Authenticator<MemoryAttemptStore> {
    pub fn new(records: Vec<CredentialRecord>) -> Self {
        Self::with_store(records, MemoryAttemptStore::default())
    }
}

impl<S: AttemptStore> Authenticator<S> {
    pub fn with_store(records: Vec<CredentialRecord>, store: S) -> Self {
        Self { records, store }
    }

    pub fn attempt_login(
        &mut self,
        username: &str,
        password: &str,
        addr: IpAddr,
        now: Instant,
    ) -> LoginOutcome {
        // A live lockout rejects without consulting credentials and without
        // touching the counter.
        if let Some(expiry) = self.store.lockout_expiry(addr) {
            if expiry > now {
                return LoginOutcome::Rejected(Rejection::LockedOut {
                    retry_after: expiry - now,
                });
            }
            // Expired: the address starts over with a clean slate, so the
            // next attempt is judged on its own merits.
            self.store.clear(addr);
        }

        // Counter already at the cap without a live lockout: refresh the
        // lockout rather than evaluating credentials.
        if self.store.failures(addr) >= MAX_ATTEMPTS {
            self.store.set_lockout(addr, now + LOCKOUT_PERIOD);
            return LoginOutcome::Rejected(Rejection::LockedOut {
                retry_after: LOCKOUT_PERIOD,
            });
        }

        // Exact, case-sensitive match; first matching record wins.
        let matched = self
            .records
            .iter()
            .find(|r| r.username == username && r.password == password);

        match matched {
            Some(record) => {
                self.store.clear(addr);
                LoginOutcome::Authorized(record.role.clone())
            }
            None => {
                let count = self.store.record_failure(addr);
                if count >= MAX_ATTEMPTS {
                    self.store.set_lockout(addr, now + LOCKOUT_PERIOD);
                    LoginOutcome::Rejected(Rejection::LockedOut {
                        retry_after: LOCKOUT_PERIOD,
                    })
                } else {
                    LoginOutcome::Rejected(Rejection::InvalidCredentials {
                        remaining_attempts: MAX_ATTEMPTS - count,
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<CredentialRecord> {
        CredentialRecord::from_rows(&[
            vec!["alice".into(), "secret1".into(), "admin".into()],
            vec!["bob".into(), "secret2".into(), "mentor".into()],
            vec!["broken row".into()],
            vec!["norole".into(), "secret3".into(), "  ".into()],
        ])
    }

    fn addr(last: u8) -> IpAddr {
        IpAddr::from([10, 0, 0, last])
    }

    #[test]
    fn short_rows_are_skipped() {
        assert_eq!(records().len(), 2);
    }

    #[test]
    fn correct_credentials_authorize_with_role() {
        let mut auth = Authenticator::new(records());
        let t0 = Instant::now();
        assert_eq!(
            auth.attempt_login("alice", "secret1", addr(1), t0),
            LoginOutcome::Authorized(Role::new("admin"))
        );
        assert_eq!(
            auth.attempt_login("bob", "secret2", addr(1), t0),
            LoginOutcome::Authorized(Role::new("mentor"))
        );
    }

    #[test]
    fn failures_count_down_then_lock() {
        let mut auth = Authenticator::new(records());
        let t0 = Instant::now();
        assert_eq!(
            auth.attempt_login("alice", "wrong", addr(1), t0),
            LoginOutcome::Rejected(Rejection::InvalidCredentials {
                remaining_attempts: 2
            })
        );
        assert_eq!(
            auth.attempt_login("alice", "wrong", addr(1), t0),
            LoginOutcome::Rejected(Rejection::InvalidCredentials {
                remaining_attempts: 1
            })
        );
        assert_eq!(
            auth.attempt_login("alice", "wrong", addr(1), t0),
            LoginOutcome::Rejected(Rejection::LockedOut {
                retry_after: LOCKOUT_PERIOD
            })
        );
    }

    #[test]
    fn lockout_rejects_even_correct_credentials() {
        let mut auth = Authenticator::new(records());
        let t0 = Instant::now();
        for _ in 0..3 {
            auth.attempt_login("alice", "wrong", addr(1), t0);
        }
        let outcome = auth.attempt_login("alice", "secret1", addr(1), t0 + Duration::from_secs(10));
        assert_eq!(
            outcome,
            LoginOutcome::Rejected(Rejection::LockedOut {
                retry_after: Duration::from_secs(50)
            })
        );
    }

    #[test]
    fn expired_lockout_is_evaluated_on_merits_and_cleared_on_success() {
        let mut auth = Authenticator::new(records());
        let t0 = Instant::now();
        for _ in 0..3 {
            auth.attempt_login("alice", "wrong", addr(1), t0);
        }
        let outcome = auth.attempt_login("alice", "secret1", addr(1), t0 + Duration::from_secs(61));
        assert_eq!(outcome, LoginOutcome::Authorized(Role::new("admin")));
        // state fully cleared: a fresh failure starts from the top again
        assert_eq!(
            auth.attempt_login("alice", "wrong", addr(1), t0 + Duration::from_secs(62)),
            LoginOutcome::Rejected(Rejection::InvalidCredentials {
                remaining_attempts: 2
            })
        );
    }

    #[test]
    fn success_resets_counter_below_cap() {
        let mut auth = Authenticator::new(records());
        let t0 = Instant::now();
        for _ in 0..2 {
            auth.attempt_login("alice", "wrong", addr(1), t0);
        }
        assert_eq!(
            auth.attempt_login("alice", "secret1", addr(1), t0),
            LoginOutcome::Authorized(Role::new("admin"))
        );
        assert_eq!(
            auth.attempt_login("alice", "wrong", addr(1), t0),
            LoginOutcome::Rejected(Rejection::InvalidCredentials {
                remaining_attempts: 2
            })
        );
    }

    #[test]
    fn addresses_are_independent() {
        let mut auth = Authenticator::new(records());
        let t0 = Instant::now();
        for _ in 0..3 {
            auth.attempt_login("alice", "wrong", addr(1), t0);
        }
        // a different address is unaffected by the first one's lockout
        assert_eq!(
            auth.attempt_login("alice", "wrong", addr(2), t0),
            LoginOutcome::Rejected(Rejection::InvalidCredentials {
                remaining_attempts: 2
            })
        );
        assert_eq!(
            auth.attempt_login("alice", "secret1", addr(2), t0),
            LoginOutcome::Authorized(Role::new("admin"))
        );
    }

    #[test]
    fn unknown_user_and_wrong_password_look_the_same() {
        let mut auth = Authenticator::new(records());
        let t0 = Instant::now();
        let known = auth.attempt_login("alice", "wrong", addr(1), t0);
        let unknown = auth.attempt_login("nonexistent_user", "wrong", addr(2), t0);
        match (known, unknown) {
            (
                LoginOutcome::Rejected(Rejection::InvalidCredentials {
                    remaining_attempts: a,
                }),
                LoginOutcome::Rejected(Rejection::InvalidCredentials {
                    remaining_attempts: b,
                }),
            ) => assert_eq!(a, b),
            other => panic!("outcomes differ in shape: {:?}", other),
        }
    }

    #[test]
    fn matching_is_case_sensitive() {
        let mut auth = Authenticator::new(records());
        let t0 = Instant::now();
        assert!(matches!(
            auth.attempt_login("Alice", "secret1", addr(1), t0),
            LoginOutcome::Rejected(Rejection::InvalidCredentials { .. })
        ));
        assert!(matches!(
            auth.attempt_login("alice", "SECRET1", addr(1), t0),
            LoginOutcome::Rejected(Rejection::InvalidCredentials { .. })
        ));
    }

    #[test]
    fn first_matching_record_wins() {
        let mut records = records();
        records.push(CredentialRecord {
            username: "alice".into(),
            password: "secret1".into(),
            role: Role::new("mentor"),
        });
        let mut auth = Authenticator::new(records);
        assert_eq!(
            auth.attempt_login("alice", "secret1", addr(1), Instant::now()),
            LoginOutcome::Authorized(Role::new("admin"))
        );
    }

    #[test]
    fn live_lockout_does_not_touch_the_counter() {
        let mut store = MemoryAttemptStore::default();
        let t0 = Instant::now();
        store.set_lockout(addr(1), t0 + Duration::from_secs(30));
        let mut auth = Authenticator::with_store(records(), store);
        auth.attempt_login("alice", "wrong", addr(1), t0);
        assert_eq!(auth.store.failures(addr(1)), 0);
    }
}
