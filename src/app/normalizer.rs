use crate::types::{LayerType, ServiceType};

/// Remap a probed service type to the layer type written into configs.
///
/// MapServer and FeatureServer endpoints are both drawn as dynamic layers;
/// every other tag keeps its meaning, including `Unknown`.
pub fn normalize(service_type: ServiceType) -> LayerType {
    match service_type {
        ServiceType::MapServer | ServiceType::FeatureServer => LayerType::Dynamic,
        ServiceType::Wms => LayerType::Wms,
        ServiceType::Wmts => LayerType::Wmts,
        ServiceType::Feature => LayerType::Feature,
        ServiceType::Tile => LayerType::Tile,
        ServiceType::Image => LayerType::Image,
        ServiceType::Unknown => LayerType::Unknown,
    }
}
