//! Entity specs of the Star Wars info service.

use crate::dispatch::REM;
use crate::spec::{FieldSpec, ModelSpec};

#[derive(strum::EnumIter, strum::Display, Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Entity {
    Starships,
    People,
    Planets,
    Films,
    Species,
    Vehicles,
}

impl Entity {
    pub fn spec(&self) -> ModelSpec {
        match self {
            Entity::Starships => starship(),
            Entity::People => person(),
            Entity::Planets => planet(),
            Entity::Films => film(),
            Entity::Species => species(),
            Entity::Vehicles => vehicle(),
        }
    }
}

fn key() -> FieldSpec {
    FieldSpec::id().width(12.0 * REM).data_key().read_only()
}

fn timestamp() -> FieldSpec {
    FieldSpec::date().read_only()
}

fn speed() -> FieldSpec {
    FieldSpec::number().width(18.0 * REM).suffix(" km")
}

pub fn starship() -> ModelSpec {
    ModelSpec::new([
        ("name", FieldSpec::text().frozen()),
        ("model", FieldSpec::text()),
        ("manufacturer", FieldSpec::text()),
        ("cost_in_credits", FieldSpec::number()),
        ("length", FieldSpec::number().decimals(2)),
        ("max_atmosphering_speed", speed()),
        ("crew", FieldSpec::number()),
        ("passengers", FieldSpec::number()),
        ("cargo_capacity", FieldSpec::number()),
        ("consumables", FieldSpec::text()),
        ("hyperdrive_rating", FieldSpec::number().decimals(1)),
        ("MGLT", FieldSpec::number()),
        ("starship_class", FieldSpec::text()),
        ("starship_id", key()),
        ("created", timestamp()),
        ("edited", timestamp()),
    ])
}

pub fn person() -> ModelSpec {
    ModelSpec::new([
        ("name", FieldSpec::text().frozen()),
        ("height", FieldSpec::number()),
        ("mass", FieldSpec::number()),
        ("hair_color", FieldSpec::text()),
        ("skin_color", FieldSpec::text()),
        ("eye_color", FieldSpec::text()),
        ("birth_year", FieldSpec::text()),
        ("gender", FieldSpec::text()),
        ("homeworld_id", FieldSpec::number()),
        ("person_id", key()),
        ("created", timestamp()),
        ("edited", timestamp()),
    ])
}

pub fn planet() -> ModelSpec {
    ModelSpec::new([
        ("name", FieldSpec::text().frozen()),
        ("rotation_period", FieldSpec::number()),
        ("orbital_period", FieldSpec::number()),
        ("diameter", FieldSpec::number()),
        ("climate", FieldSpec::text()),
        ("gravity", FieldSpec::number().decimals(2).suffix(" standard")),
        ("terrain", FieldSpec::text()),
        ("surface_water", FieldSpec::number()),
        ("population", FieldSpec::number()),
        ("planet_id", key()),
        ("created", timestamp()),
        ("edited", timestamp()),
    ])
}

pub fn film() -> ModelSpec {
    ModelSpec::new([
        ("film_id", key()),
        ("title", FieldSpec::text()),
        ("episode_id", FieldSpec::number()),
        ("opening_crawl", FieldSpec::text()),
        ("director", FieldSpec::text()),
        ("producer", FieldSpec::text()),
        ("release_date", FieldSpec::date()),
        ("created", timestamp()),
        ("edited", timestamp()),
    ])
}

pub fn species() -> ModelSpec {
    ModelSpec::new([
        ("name", FieldSpec::text().frozen()),
        ("classification", FieldSpec::text()),
        ("designation", FieldSpec::text()),
        ("average_height", FieldSpec::number()),
        ("skin_colors", FieldSpec::text()),
        ("hair_colors", FieldSpec::text()),
        ("eye_colors", FieldSpec::text()),
        ("average_lifespan", FieldSpec::number()),
        ("homeworld_id", FieldSpec::number()),
        ("language", FieldSpec::text()),
        ("species_id", key()),
        ("created", timestamp()),
        ("edited", timestamp()),
    ])
}

pub fn vehicle() -> ModelSpec {
    ModelSpec::new([
        ("name", FieldSpec::text().frozen()),
        ("model", FieldSpec::text()),
        ("manufacturer", FieldSpec::text()),
        ("cost_in_credits", FieldSpec::number()),
        ("length", FieldSpec::number().decimals(2)),
        ("max_atmosphering_speed", speed()),
        ("crew", FieldSpec::number()),
        ("passengers", FieldSpec::number()),
        ("cargo_capacity", FieldSpec::text()),
        ("consumables", FieldSpec::text()),
        ("vehicle_class", FieldSpec::text()),
        ("vehicle_id", key()),
        ("created", timestamp()),
        ("edited", timestamp()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use pretty_assertions::assert_eq;
    use strum::IntoEnumIterator;

    #[test]
    fn every_entity_spec_is_valid() {
        for entity in Entity::iter() {
            assert_eq!(entity.spec().validate(), Ok(()), "{entity}");
        }
    }

    #[test]
    fn resources_follow_key_names() {
        let config = ClientConfig::new("http://x");
        let resources = Entity::iter()
            .map(|e| config.resource_for(e.spec().data_key_of().unwrap()))
            .collect::<Vec<_>>();
        assert_eq!(
            resources,
            ["starship", "person", "planet", "film", "species", "vehicle"]
        );
    }

    #[test]
    fn timestamps_are_date_fields() {
        assert_eq!(starship().date_fields_of(), vec!["created", "edited"]);
        assert_eq!(film().date_fields_of(), vec!["release_date", "created", "edited"]);
    }
}
