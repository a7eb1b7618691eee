use std::sync::atomic::{AtomicU64, Ordering};

/// Access counters shared by the login handler and the page guard.
#[derive(Default)]
pub struct AccessMetrics {
    pub logins_succeeded: AtomicU64,
    pub logins_failed: AtomicU64,
    pub requests_allowed: AtomicU64,
    pub requests_denied: AtomicU64,
}

impl AccessMetrics {
    pub fn inc_login_succeeded(&self) {
        self.logins_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_login_failed(&self) {
        self.logins_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_allowed(&self) {
        self.requests_allowed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_denied(&self) {
        self.requests_denied.fetch_add(1, Ordering::Relaxed);
    }

    /// Serialize to Prometheus text exposition format.
    pub fn to_prometheus_text(&self) -> String {
        let ok = self.logins_succeeded.load(Ordering::Relaxed);
        let failed = self.logins_failed.load(Ordering::Relaxed);
        let allowed = self.requests_allowed.load(Ordering::Relaxed);
        let denied = self.requests_denied.load(Ordering::Relaxed);

        format!(
            "# HELP hamere_logins_total Login attempts by outcome\n\
             # TYPE hamere_logins_total counter\n\
             hamere_logins_total{{outcome=\"success\"}} {ok}\n\
             hamere_logins_total{{outcome=\"failure\"}} {failed}\n\
             # HELP hamere_guarded_requests_total Page guard decisions\n\
             # TYPE hamere_guarded_requests_total counter\n\
             hamere_guarded_requests_total{{decision=\"allow\"}} {allowed}\n\
             hamere_guarded_requests_total{{decision=\"deny\"}} {denied}\n"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prometheus_text_reflects_counters() {
        let m = AccessMetrics::default();
        m.inc_login_succeeded();
        m.inc_login_failed();
        m.inc_login_failed();
        m.inc_denied();

        let text = m.to_prometheus_text();
        assert!(text.contains("hamere_logins_total{outcome=\"success\"} 1"));
        assert!(text.contains("hamere_logins_total{outcome=\"failure\"} 2"));
        assert!(text.contains("hamere_guarded_requests_total{decision=\"allow\"} 0"));
        assert!(text.contains("hamere_guarded_requests_total{decision=\"deny\"} 1"));
    }
}
