use crate::models::bin::{CategoryMap, WasteCategory};
use crate::models::collection::CollectionEvent;

/// kg of CO2 avoided per kg of diverted waste.
pub fn co2_factor(category: WasteCategory) -> f64 {
    match category {
        WasteCategory::Plastic => 2.0,
        WasteCategory::Organic => 0.5,
        WasteCategory::Hazardous => 3.0,
        WasteCategory::Others => 1.5,
    }
}

pub fn co2_saved<'a>(
    events: impl IntoIterator<Item = &'a CollectionEvent>,
) -> (f64, CategoryMap<f64>) {
    let mut per_category = CategoryMap::<f64>::default();

    for event in events {
        for (category, sensor) in event.waste_collected.iter() {
            *per_category.get_mut(category) += sensor.weight_kg * co2_factor(category);
        }
    }

    let total: f64 = per_category.iter().map(|(_, kg)| kg).sum();
    (total, per_category)
}
