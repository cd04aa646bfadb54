use crate::core::telemetry::record::{
    DecodedRecord, FireReading, HomeEnvironment, PetReading, PlantReading,
};
use crate::domain::error::GatewayResult;
use async_trait::async_trait;
use tracing::info;

/// Persistence collaborator for decoded telemetry.
///
/// Implementations shared across tasks must serialize their own access.
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn insert_fire(&self, reading: &FireReading) -> GatewayResult<()>;

    async fn insert_pet(&self, reading: &PetReading) -> GatewayResult<()>;

    async fn insert_plant(&self, reading: &PlantReading) -> GatewayResult<()>;

    async fn insert_home(&self, environment: &HomeEnvironment) -> GatewayResult<()>;
}

/// Route one record to the matching inserts.
///
/// A plant reading is stored twice, once as a plant sample and once as a home
/// climate sample.
pub async fn dispatch(sink: &dyn TelemetrySink, record: &DecodedRecord) -> GatewayResult<()> {
    match record {
        DecodedRecord::Fire(reading) => sink.insert_fire(reading).await,
        DecodedRecord::Pet(reading) => sink.insert_pet(reading).await,
        DecodedRecord::Plant(reading) => {
            sink.insert_plant(reading).await?;
            sink.insert_home(&reading.home_environment()).await
        }
    }
}

/// Sink that only logs each insert
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl TelemetrySink for LogSink {
    async fn insert_fire(&self, reading: &FireReading) -> GatewayResult<()> {
        info!(
            source = %reading.source,
            fire_level = reading.fire_level,
            fire_status = %reading.fire_status,
            gas_level = reading.gas_level,
            gas_status = %reading.gas_status,
            "fire reading"
        );
        Ok(())
    }

    async fn insert_pet(&self, reading: &PetReading) -> GatewayResult<()> {
        info!(
            source = %reading.source,
            food = %reading.food,
            water = %reading.water,
            toilet = %reading.toilet,
            "pet reading"
        );
        Ok(())
    }

    async fn insert_plant(&self, reading: &PlantReading) -> GatewayResult<()> {
        info!(
            source = %reading.source,
            soil_moisture = reading.soil_moisture,
            illumination = reading.illumination,
            temperature = reading.temperature,
            humidity = reading.humidity,
            "plant reading"
        );
        Ok(())
    }

    async fn insert_home(&self, environment: &HomeEnvironment) -> GatewayResult<()> {
        info!(
            temperature = environment.temperature,
            humidity = environment.humidity,
            illumination = environment.illumination,
            "home environment"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::telemetry::record::RecordDecoder;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        inserts: Mutex<Vec<&'static str>>,
    }

    impl RecordingSink {
        fn push(&self, table: &'static str) -> GatewayResult<()> {
            self.inserts.lock().unwrap().push(table);
            Ok(())
        }
    }

    #[async_trait]
    impl TelemetrySink for RecordingSink {
        async fn insert_fire(&self, _: &FireReading) -> GatewayResult<()> {
            self.push("fire")
        }

        async fn insert_pet(&self, _: &PetReading) -> GatewayResult<()> {
            self.push("pet")
        }

        async fn insert_plant(&self, _: &PlantReading) -> GatewayResult<()> {
            self.push("plant")
        }

        async fn insert_home(&self, _: &HomeEnvironment) -> GatewayResult<()> {
            self.push("home")
        }
    }

    #[tokio::test]
    async fn test_dispatch_routes_by_kind() {
        let sink = RecordingSink::default();
        let decoder = RecordDecoder::default();

        for line in ["m1_fire_200_650.0", "m1_pet_1_0_1", "m1_plant_1_2_3_4"] {
            let record = decoder.decode(line).unwrap().unwrap();
            dispatch(&sink, &record).await.unwrap();
        }

        assert_eq!(
            *sink.inserts.lock().unwrap(),
            vec!["fire", "pet", "plant", "home"]
        );
    }

    #[tokio::test]
    async fn test_log_sink_accepts_everything() {
        let decoder = RecordDecoder::default();
        let record = decoder.decode("m1_plant_1_2_3_4").unwrap().unwrap();
        assert!(dispatch(&LogSink, &record).await.is_ok());
    }
}
