use super::{RecordSource, SleepProvider, TokioSleep};
use crate::{Car, Error, Result};
use core::{marker::PhantomData, time::Duration};
use std::collections::VecDeque;

enum Script {
    Finite(VecDeque<Car>),
    Endless { next_id: u64 },
}

/// A deterministic source replaying a fixed script.
///
/// Used to pin down ordering, timeout and fault behavior without depending on
/// random output:
///
/// - [`ScriptedSource::new`] replays the given cars, then reports exhaustion.
/// - [`ScriptedSource::endless`] never exhausts; only a timeout or
///   cancellation ends it.
/// - [`ScriptedSource::fail_after`] injects a source fault once `n` records
///   were emitted.
pub struct ScriptedSource<S = TokioSleep> {
    script: Script,
    interval: Duration,
    fault: Option<(usize, String)>,
    emitted: usize,
    _sleep: PhantomData<fn() -> S>,
}

impl<S: SleepProvider> ScriptedSource<S> {
    pub fn new(cars: impl IntoIterator<Item = Car>) -> Self {
        Self::from_script(Script::Finite(cars.into_iter().collect()))
    }

    /// Emits `Car { id: n, model: "Model n", manufacturer: "Scripted" }` for
    /// `n = 1, 2, ...` forever.
    pub fn endless() -> Self {
        Self::from_script(Script::Endless { next_id: 1 })
    }

    fn from_script(script: Script) -> Self {
        Self {
            script,
            interval: Duration::ZERO,
            fault: None,
            emitted: 0,
            _sleep: PhantomData,
        }
    }

    /// Pauses for `interval` before every record.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Faults with `reason` instead of producing record number `n + 1`.
    #[must_use]
    pub fn fail_after(mut self, n: usize, reason: impl Into<String>) -> Self {
        self.fault = Some((n, reason.into()));
        self
    }
}

impl<S: SleepProvider + 'static> RecordSource for ScriptedSource<S> {
    fn next_record(&mut self) -> impl Future<Output = Result<Option<Car>>> + Send {
        async move {
            if let Some((n, reason)) = &self.fault {
                if self.emitted >= *n {
                    return Err(Error::source(reason.clone()));
                }
            }

            let car = match &mut self.script {
                Script::Finite(cars) => match cars.pop_front() {
                    Some(car) => car,
                    None => return Ok(None),
                },
                Script::Endless { next_id } => {
                    let id = *next_id;
                    *next_id += 1;
                    Car::new(id, format!("Model {id}"), "Scripted")
                }
            };

            if !self.interval.is_zero() {
                S::sleep_for(self.interval).await;
            }
            self.emitted += 1;
            Ok(Some(car))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TokioYield;

    fn cars(n: u64) -> Vec<Car> {
        (1..=n).map(|id| Car::new(id, "Golf", "Volkswagen")).collect()
    }

    #[tokio::test]
    async fn replays_script_in_order() {
        let mut source = ScriptedSource::<TokioYield>::new(cars(3));
        for id in 1..=3 {
            assert_eq!(source.next_record().await.unwrap().map(|c| c.id), Some(id));
        }
        assert_eq!(source.next_record().await.unwrap(), None);
    }

    #[tokio::test]
    async fn faults_after_n_records() {
        let mut source = ScriptedSource::<TokioYield>::new(cars(5)).fail_after(2, "boom");
        assert!(source.next_record().await.unwrap().is_some());
        assert!(source.next_record().await.unwrap().is_some());
        assert_eq!(source.next_record().await, Err(Error::source("boom")));
    }

    #[tokio::test]
    async fn endless_keeps_counting() {
        let mut source = ScriptedSource::<TokioYield>::endless();
        for id in 1..=100 {
            let car = source.next_record().await.unwrap().unwrap();
            assert_eq!(car.id, id);
        }
    }
}
