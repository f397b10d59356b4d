use super::{RecordSource, SleepProvider, SourceFactory, TokioSleep};
use crate::{Car, Result};
use core::{marker::PhantomData, time::Duration};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Manufacturers and the models the generator picks from.
pub const CATALOG: &[(&str, &[&str])] = &[
    ("Audi", &["A3", "A4", "Q5", "e-tron"]),
    ("BMW", &["i3", "M3", "X5", "320d"]),
    ("Ford", &["Fiesta", "Focus", "Mustang"]),
    ("Tesla", &["Model 3", "Model S", "Model X", "Model Y"]),
    ("Toyota", &["Corolla", "Prius", "Yaris"]),
    ("Volkswagen", &["Golf", "Passat", "Polo", "ID.3"]),
];

/// Manufactures an endless (or capped) sequence of random cars.
///
/// Ids start at 1 and increase by one per record. Each call to
/// [`next_record`](RecordSource::next_record) first sleeps for `interval`
/// using `S`, so a subscription with timeout `T` sees roughly
/// `T / interval` records.
pub struct CarSource<S = TokioSleep> {
    next_id: u64,
    interval: Duration,
    max_records: Option<usize>,
    emitted: usize,
    rng: StdRng,
    _sleep: PhantomData<fn() -> S>,
}

impl<S: SleepProvider> CarSource<S> {
    /// Creates a source seeded from the operating system.
    pub fn new(interval: Duration, max_records: Option<usize>) -> Self {
        Self::with_rng(interval, max_records, StdRng::from_os_rng())
    }

    /// Creates a source with a fixed seed, producing a reproducible sequence.
    pub fn seeded(interval: Duration, max_records: Option<usize>, seed: u64) -> Self {
        Self::with_rng(interval, max_records, StdRng::seed_from_u64(seed))
    }

    fn with_rng(interval: Duration, max_records: Option<usize>, rng: StdRng) -> Self {
        Self {
            next_id: 1,
            interval,
            max_records,
            emitted: 0,
            rng,
            _sleep: PhantomData,
        }
    }

    fn manufacture(&mut self) -> Car {
        let (manufacturer, models) = CATALOG[self.rng.random_range(0..CATALOG.len())];
        let model = models[self.rng.random_range(0..models.len())];
        let car = Car::new(self.next_id, model, manufacturer);
        self.next_id += 1;
        car
    }
}

impl<S: SleepProvider + 'static> RecordSource for CarSource<S> {
    fn next_record(&mut self) -> impl Future<Output = Result<Option<Car>>> + Send {
        async move {
            if self.max_records.is_some_and(|max| self.emitted >= max) {
                return Ok(None);
            }
            S::sleep_for(self.interval).await;
            self.emitted += 1;
            Ok(Some(self.manufacture()))
        }
    }
}

/// [`SourceFactory`] handing every subscription its own [`CarSource`].
#[derive(Clone, Debug)]
pub struct CarFactory {
    interval: Duration,
    max_records: Option<usize>,
}

impl CarFactory {
    pub const fn new(interval: Duration, max_records: Option<usize>) -> Self {
        Self {
            interval,
            max_records,
        }
    }
}

impl SourceFactory for CarFactory {
    type Source = CarSource;

    fn create(&self) -> Self::Source {
        CarSource::new(self.interval, self.max_records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TokioYield;

    #[tokio::test]
    async fn ids_increase_from_one() {
        let mut source = CarSource::<TokioYield>::seeded(Duration::ZERO, Some(3), 42);
        let mut ids = Vec::new();
        while let Some(car) = source.next_record().await.unwrap() {
            ids.push(car.id);
        }
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn picks_models_from_the_catalog() {
        let mut source = CarSource::<TokioYield>::seeded(Duration::ZERO, Some(64), 7);
        while let Some(car) = source.next_record().await.unwrap() {
            let (_, models) = CATALOG
                .iter()
                .find(|(manufacturer, _)| *manufacturer == car.manufacturer)
                .expect("manufacturer not in catalog");
            assert!(models.contains(&car.model.as_str()));
        }
    }

    #[tokio::test]
    async fn same_seed_same_sequence() {
        let mut a = CarSource::<TokioYield>::seeded(Duration::ZERO, Some(16), 99);
        let mut b = CarSource::<TokioYield>::seeded(Duration::ZERO, Some(16), 99);
        for _ in 0..16 {
            assert_eq!(a.next_record().await.unwrap(), b.next_record().await.unwrap());
        }
        assert_eq!(a.next_record().await.unwrap(), None);
    }

    #[tokio::test]
    async fn factory_sources_are_independent() {
        let factory = CarFactory::new(Duration::ZERO, Some(2));
        let mut first = factory.create();
        let mut second = factory.create();
        assert_eq!(first.next_record().await.unwrap().map(|c| c.id), Some(1));
        assert_eq!(second.next_record().await.unwrap().map(|c| c.id), Some(1));
    }
}
