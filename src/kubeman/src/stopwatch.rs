use std::collections::BTreeMap;
use std::time::Duration;
use std::time::Instant;

#[derive(Debug, Default)]
struct Timer {
    started: Option<Instant>,
    elapsed: Duration,
}

/// named wall-clock timers, one per lifecycle phase
#[derive(Debug, Default)]
pub struct StopWatch {
    timers: BTreeMap<String, Timer>,
}

impl StopWatch {
    pub fn start(&mut self, name: &str) {
        self.timers.entry(name.to_owned()).or_default().started = Some(Instant::now());
    }

    /// stops `name` and adds the running time to its total
    pub fn stop(&mut self, name: &str) -> Duration {
        let timer = self.timers.entry(name.to_owned()).or_default();
        if let Some(started) = timer.started.take() {
            timer.elapsed += started.elapsed();
        }
        timer.elapsed
    }

    /// total so far, including a still running interval
    pub fn elapsed(&self, name: &str) -> Option<Duration> {
        self.timers.get(name).map(|timer| {
            timer.elapsed + timer.started.map(|s| s.elapsed()).unwrap_or_default()
        })
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn summary(&self) -> String {
        let mut out = String::new();
        for (name, timer) in &self.timers {
            let running = if timer.started.is_some() { " (running)" } else { "" };
            let total = self.elapsed(name).unwrap_or_default();
            out.push_str(&format!(
                "{:<25} {:>10.3} s{}\n",
                name,
                total.as_secs_f64(),
                running
            ));
        }
        out
    }
}
