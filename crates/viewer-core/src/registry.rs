//! Overlay layer registry.
//!
//! The registry is the single source of truth for which WMS overlays the
//! viewer can show: source endpoints, draw order, record filtering, linked
//! groups and legends. It is built once at startup from the built-in table,
//! optionally overridden from a YAML file, and never mutated afterwards.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use map_common::{MapError, MapResult};
use ogc_client::WmsVersion;

/// GeoServer endpoint carrying the worksite overlay layers.
pub const HDGIS_WMS: &str = "https://hdgis.gis.dk/geoserver/hdgis/wms";

/// OWS endpoint on the same GeoServer, used for WFS feature queries.
pub const HDGIS_OWS: &str = "https://hdgis.gis.dk/geoserver/hdgis/ows";

/// Linked-group key for the road theme and its symbol layers.
pub const ROAD_GROUP: &str = "vejtema";

/// A WFS point-feature source feeding a marker/label overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointSource {
    pub endpoint: String,
    /// Qualified feature type, e.g. "hdgis:DynamicMapPoints".
    pub type_name: String,
    /// Property used as marker label; features missing it fall back to the
    /// record key.
    pub label_property: String,
}

/// Swatch shape for a static legend entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwatchKind {
    Square,
    Circle,
    Line,
}

/// One row of a static legend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub label: String,
    pub swatch: SwatchKind,
    /// CSS color, e.g. "#0067cf".
    pub color: String,
}

/// A fixed legend attached to a layer definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Legend {
    pub title: String,
    pub entries: Vec<LegendEntry>,
}

/// One overlay layer definition. Immutable after startup.
#[derive(Debug, Clone)]
pub struct LayerDefinition {
    /// Unique identifier used in toggles and API calls.
    pub id: String,
    /// Display name shown in the layer panel.
    pub title: String,
    /// WMS endpoint URL.
    pub endpoint: String,
    /// Source layer name(s), e.g. "hdgis:DynamicMapStands".
    pub layers: String,
    /// Image format for GetMap.
    pub format: String,
    pub transparent: bool,
    pub version: WmsVersion,
    /// Stacking order; higher is painted on top.
    pub draw_order: i32,
    /// Whether the record-identifier CQL filter is injected into requests.
    pub record_filter: bool,
    /// Auth token appended as a `token` query parameter.
    pub token: Option<String>,
    /// Additional static request parameters.
    pub extra_params: Vec<(String, String)>,
    /// Linked-group key; toggling any member toggles the whole group.
    pub group: Option<String>,
    /// Static legend shown while the layer is active.
    pub legend: Option<Legend>,
    /// Point-feature source for the marker/label overlay tied to this layer.
    pub point_source: Option<PointSource>,
    /// Enabled when a view starts.
    pub default_active: bool,
}

impl LayerDefinition {
    fn new(
        id: &str,
        title: &str,
        endpoint: &str,
        layers: &str,
        draw_order: i32,
        record_filter: bool,
    ) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            endpoint: endpoint.to_string(),
            layers: layers.to_string(),
            format: "image/png".to_string(),
            transparent: true,
            version: WmsVersion::V1_1_0,
            draw_order,
            record_filter,
            token: None,
            extra_params: Vec::new(),
            group: None,
            legend: None,
            point_source: None,
            default_active: record_filter,
        }
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Ordered, immutable table of overlay definitions.
#[derive(Debug, Clone)]
pub struct LayerRegistry {
    layers: Vec<LayerDefinition>,
}

impl LayerRegistry {
    /// Build a registry from explicit definitions, validating uniqueness.
    pub fn from_definitions(layers: Vec<LayerDefinition>) -> MapResult<Self> {
        let mut seen = std::collections::HashSet::new();
        for layer in &layers {
            if !seen.insert(layer.id.as_str()) {
                return Err(MapError::ConfigError(format!(
                    "Duplicate layer id: {}",
                    layer.id
                )));
            }
        }
        Ok(Self { layers })
    }

    /// The built-in overlay table.
    ///
    /// Draw orders and source layer names match the upstream GeoServer
    /// configuration. Tokens are left empty; deployment config injects them.
    pub fn builtin() -> Self {
        let mut skaermkort = LayerDefinition::new(
            "skaermkort",
            "Skærmkort",
            "https://api.dataforsyningen.dk/topo_skaermkort_DAF",
            "dtk_skaermkort",
            0,
            false,
        );
        skaermkort.default_active = false;

        let mut ortofoto = LayerDefinition::new(
            "ortofoto",
            "Ortofoto",
            "https://api.dataforsyningen.dk/orto_foraar_DAF",
            "orto_foraar",
            1,
            false,
        );
        ortofoto.default_active = false;

        let skovkort = LayerDefinition::new(
            "skovkort",
            "Skovkort",
            HDGIS_WMS,
            "hdgis:SkovkortDynamicMaps",
            5,
            true,
        );

        let mut veje = LayerDefinition::new(
            "veje",
            "Vejtema",
            HDGIS_WMS,
            "hdgis:VejtemaDynamicMaps",
            6,
            true,
        );
        veje.group = Some(ROAD_GROUP.to_string());
        veje.legend = Some(Legend {
            title: "Vejtema".to_string(),
            entries: vec![
                LegendEntry {
                    label: "Vendeplads".to_string(),
                    swatch: SwatchKind::Circle,
                    color: "#2ecc40".to_string(),
                },
                LegendEntry {
                    label: "Lastbilvej".to_string(),
                    swatch: SwatchKind::Line,
                    color: "#2ecc40".to_string(),
                },
                LegendEntry {
                    label: "Lastbilvej forbudt".to_string(),
                    swatch: SwatchKind::Line,
                    color: "#ff69b4".to_string(),
                },
                LegendEntry {
                    label: "Personbilvej".to_string(),
                    swatch: SwatchKind::Line,
                    color: "#00e5ee".to_string(),
                },
                LegendEntry {
                    label: "Andet".to_string(),
                    swatch: SwatchKind::Square,
                    color: "#bada55".to_string(),
                },
            ],
        });

        let ao = LayerDefinition::new(
            "ao",
            "Arbejdsområde",
            HDGIS_WMS,
            "hdgis:DynamicMapStands",
            8,
            true,
        );

        let mut containermapsymbols = LayerDefinition::new(
            "containermapsymbols",
            "Containermapsymbols",
            HDGIS_WMS,
            "hdgis:MapsymbolsDynamicMapsPoints",
            10,
            true,
        );
        containermapsymbols.group = Some(ROAD_GROUP.to_string());
        containermapsymbols.legend = Some(Legend {
            title: "Stakke".to_string(),
            entries: vec![
                LegendEntry {
                    label: "Afsluttet".to_string(),
                    swatch: SwatchKind::Square,
                    color: "#e62024".to_string(),
                },
                LegendEntry {
                    label: "Aktiv".to_string(),
                    swatch: SwatchKind::Square,
                    color: "#0067cf".to_string(),
                },
            ],
        });
        containermapsymbols.point_source = Some(PointSource {
            endpoint: HDGIS_OWS.to_string(),
            type_name: "hdgis:DynamicMapPoints".to_string(),
            label_property: "stakkenr".to_string(),
        });

        let mut vejemapsymbols = LayerDefinition::new(
            "vejemapsymbols",
            "Vejemapsymbols",
            HDGIS_WMS,
            "hdgis:MapsymbolsDynamicMapsPolygons",
            11,
            true,
        );
        vejemapsymbols.group = Some(ROAD_GROUP.to_string());

        let beregnetrute = LayerDefinition::new(
            "beregnetrute",
            "Beregnet rute",
            HDGIS_WMS,
            "hdgis:CalculatedRoutesHDStak",
            12,
            true,
        );

        // Registry order is the tie-break for equal draw orders.
        Self {
            layers: vec![
                skaermkort,
                ortofoto,
                skovkort,
                veje,
                ao,
                containermapsymbols,
                vejemapsymbols,
                beregnetrute,
            ],
        }
    }

    pub fn get(&self, id: &str) -> Option<&LayerDefinition> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LayerDefinition> {
        self.layers.iter()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Ids of every member of a linked group, in registry order.
    pub fn group_members(&self, group: &str) -> Vec<&str> {
        self.layers
            .iter()
            .filter(|l| l.group.as_deref() == Some(group))
            .map(|l| l.id.as_str())
            .collect()
    }

    /// Point sources attached to the given layers, in registry order.
    pub fn point_sources<'a>(
        &'a self,
        active_ids: impl Fn(&str) -> bool + 'a,
    ) -> impl Iterator<Item = (&'a LayerDefinition, &'a PointSource)> {
        self.layers.iter().filter_map(move |l| {
            let source = l.point_source.as_ref()?;
            active_ids(&l.id).then_some((l, source))
        })
    }

    /// Apply overrides loaded from a YAML file.
    pub fn apply_overrides(&mut self, overrides: &RegistryOverrides) {
        for entry in &overrides.layers {
            let Some(layer) = self.layers.iter_mut().find(|l| l.id == entry.id) else {
                warn!(layer = %entry.id, "Override for unknown layer ignored");
                continue;
            };

            if let Some(endpoint) = &entry.endpoint {
                layer.endpoint = endpoint.clone();
            }
            if let Some(layers) = &entry.layers {
                layer.layers = layers.clone();
            }
            if let Some(format) = &entry.format {
                layer.format = format.clone();
            }
            if let Some(version) = &entry.version {
                match WmsVersion::parse(version) {
                    Ok(v) => layer.version = v,
                    Err(_) => {
                        warn!(layer = %entry.id, version = %version, "Unknown WMS version in override ignored")
                    }
                }
            }
            if let Some(draw_order) = entry.draw_order {
                layer.draw_order = draw_order;
            }
            if let Some(token) = &entry.token {
                layer.token = Some(token.clone());
            }
            if let Some(default_active) = entry.default_active {
                layer.default_active = default_active;
            }
            if let Some(label_property) = &entry.label_property {
                if let Some(source) = layer.point_source.as_mut() {
                    source.label_property = label_property.clone();
                } else {
                    warn!(layer = %entry.id, "label_property override on layer without point source ignored");
                }
            }
        }
        info!(layers = self.layers.len(), "Layer registry configured");
    }
}

// ============================================================================
// YAML Override Structures
// ============================================================================

/// Per-deployment registry overrides (tokens, endpoints, draw order).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistryOverrides {
    #[serde(default)]
    pub layers: Vec<LayerOverride>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LayerOverride {
    pub id: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub layers: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub draw_order: Option<i32>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub default_active: Option<bool>,
    #[serde(default)]
    pub label_property: Option<String>,
}

impl RegistryOverrides {
    /// Load overrides from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> MapResult<Self> {
        let contents = fs::read_to_string(path.as_ref()).map_err(|e| {
            MapError::ConfigError(format!(
                "Failed to read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        serde_yaml::from_str(&contents).map_err(|e| {
            MapError::ConfigError(format!(
                "Failed to parse {}: {}",
                path.as_ref().display(),
                e
            ))
        })
    }
}
