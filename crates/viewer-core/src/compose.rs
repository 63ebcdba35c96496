//! Layer composition.
//!
//! Turns the registry and the active selection into the ordered list of WMS
//! render requests a view needs, with the record filter injected into every
//! record-scoped layer.

use map_common::{BoundingBox, CrsCode, RecordRef};
use ogc_client::{
    CqlFilter, GetFeatureInfoRequest, GetLegendGraphicRequest, GetMapRequest, OgcError,
};
use url::Url;

use crate::active::ActiveLayerSet;
use crate::registry::{LayerRegistry, Legend};

/// One composed overlay: the WMS request template plus presentation metadata.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub layer_id: String,
    pub title: String,
    pub draw_order: i32,
    pub legend: Option<Legend>,
    pub wms: GetMapRequest,
}

impl RenderRequest {
    /// The per-layer constant request parameters.
    ///
    /// Bounding box and pixel size are omitted; the map client appends them
    /// per tile.
    pub fn static_params(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("VERSION".to_string(), self.wms.version.as_str().to_string()),
            ("LAYERS".to_string(), self.wms.layers.clone()),
            ("STYLES".to_string(), self.wms.styles.clone()),
            ("FORMAT".to_string(), self.wms.format.clone()),
            ("TRANSPARENT".to_string(), self.wms.transparent.to_string()),
        ];
        for (k, v) in &self.wms.extra {
            pairs.push((k.clone(), v.clone()));
        }
        if let Some(filter) = &self.wms.cql_filter {
            pairs.push(("CQL_FILTER".to_string(), filter.to_string()));
        }
        pairs
    }

    /// Full GetMap URL for a single rendered image.
    pub fn getmap_url(&self, bbox: &BoundingBox, width: u32, height: u32) -> Result<Url, OgcError> {
        self.wms.to_url(bbox, width, height)
    }

    /// GetLegendGraphic URL for this layer's source.
    pub fn legend_graphic_url(&self) -> Result<Url, OgcError> {
        GetLegendGraphicRequest {
            endpoint: self.wms.endpoint.clone(),
            layer: self.wms.layers.clone(),
            format: "image/png".to_string(),
            version: self.wms.version,
            extra: self.wms.extra.clone(),
        }
        .to_url()
    }

    /// GetFeatureInfo template probing this layer, keeping its filter so the
    /// probe only sees the record's own features.
    pub fn feature_info(&self, feature_count: u32) -> GetFeatureInfoRequest {
        GetFeatureInfoRequest {
            endpoint: self.wms.endpoint.clone(),
            layers: self.wms.layers.clone(),
            query_layers: self.wms.layers.clone(),
            version: self.wms.version,
            crs: self.wms.crs,
            info_format: "application/json".to_string(),
            feature_count,
            extra: self.wms.extra.clone(),
            cql_filter: self.wms.cql_filter.clone(),
        }
    }
}

/// Compose the active layers for a record into render requests.
///
/// Output is ordered by descending draw order; ties keep registry order.
/// Record-scoped layers get the record's CQL filter, shared layers do not.
pub fn compose(
    registry: &LayerRegistry,
    active: &ActiveLayerSet,
    record: &RecordRef,
) -> Vec<RenderRequest> {
    let mut requests: Vec<RenderRequest> = registry
        .iter()
        .filter(|layer| active.contains(&layer.id))
        .map(|layer| {
            let mut extra = layer.extra_params.clone();
            if let Some(token) = &layer.token {
                extra.push(("token".to_string(), token.clone()));
            }
            let cql_filter = layer.record_filter.then(|| CqlFilter::for_record(record));

            RenderRequest {
                layer_id: layer.id.clone(),
                title: layer.title.clone(),
                draw_order: layer.draw_order,
                legend: layer.legend.clone(),
                wms: GetMapRequest {
                    endpoint: layer.endpoint.clone(),
                    layers: layer.layers.clone(),
                    styles: String::new(),
                    format: layer.format.clone(),
                    transparent: layer.transparent,
                    version: layer.version,
                    crs: CrsCode::Epsg3857,
                    extra,
                    cql_filter,
                },
            }
        })
        .collect();

    // sort_by is stable, so equal draw orders keep registry order.
    requests.sort_by(|a, b| b.draw_order.cmp(&a.draw_order));
    requests
}
