//! HTML pages: the embedded map viewer and the root landing page.
//!
//! The viewer is a single self-contained page; assets come from the unpkg
//! CDN and all data is fetched from the JSON API. The record identifier is
//! injected into the page as a JSON literal at render time.

use axum::{
    extract::Path,
    response::{Html, IntoResponse, Response},
};
use tracing::instrument;

use map_common::RecordRef;

/// Landing page for requests without a record identifier.
const ROOT_HTML: &str = r##"<!DOCTYPE html>
<html lang="da">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Kort</title>
    <style>
        body { margin: 0; background: #f3f4f6; font-family: system-ui, sans-serif; }
        .notice {
            min-height: 100vh;
            display: flex;
            align-items: center;
            justify-content: center;
            color: #4b5563;
        }
    </style>
</head>
<body>
    <div class="notice"><p>Applikationen skal &aring;bnes fra tildelt link</p></div>
</body>
</html>"##;

/// The embedded map viewer.
///
/// `__RECORD_JSON__` is replaced with the JSON-encoded record identifier.
const VIEWER_HTML: &str = r##"<!DOCTYPE html>
<html lang="da">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Kort</title>
    <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
    <style>
        html, body { margin: 0; height: 100%; font-family: system-ui, sans-serif; }
        #map { position: absolute; inset: 0; }
        #status {
            position: absolute; inset: 0; z-index: 2000;
            display: flex; align-items: center; justify-content: center;
            background: #f3f4f6; color: #4b5563; text-align: center;
            padding: 0 24px;
        }
        #status.unavailable { background: #fef2f2; color: #b91c1c; }
        #status .contact { margin-top: 8px; font-size: 0.9rem; color: #6b7280; }
        #status.hidden { display: none; }
        #site-info {
            position: absolute; top: 16px; left: 16px; z-index: 1000;
            background: rgba(255, 255, 255, 0.95); border-radius: 8px;
            box-shadow: 0 1px 4px rgba(0, 0, 0, 0.25); padding: 8px 14px;
            max-width: 60vw;
        }
        #site-info .name { font-weight: 600; }
        #site-info .updated { font-size: 0.8rem; color: #6b7280; }
        #panel {
            position: absolute; top: 16px; right: 16px; z-index: 1000;
            background: #fff; border-radius: 8px; padding: 14px 16px;
            box-shadow: 0 1px 4px rgba(0, 0, 0, 0.25);
            max-height: calc(100vh - 2rem); overflow-y: auto; min-width: 180px;
        }
        #panel h3 { margin: 0 0 10px; font-size: 1.05rem; }
        #panel label { display: flex; align-items: center; gap: 8px; margin: 6px 0; font-size: 0.9rem; cursor: pointer; }
        .legend { margin: 2px 0 8px 24px; }
        .legend .title { font-size: 0.8rem; font-weight: 600; margin-bottom: 2px; }
        .legend .entry { display: flex; align-items: center; gap: 6px; font-size: 0.8rem; color: #374151; }
        .swatch { display: inline-block; width: 13px; height: 13px; }
        .swatch.circle { border-radius: 50%; }
        .swatch.line { width: 18px; height: 4px; }
        #navigate {
            margin-top: 10px; width: 100%; padding: 6px 0; cursor: pointer;
            border: 1px solid #d1d5db; border-radius: 6px; background: #f9fafb;
            font-size: 0.85rem;
        }
        #navigate:hover { background: #f3f4f6; }
        .logo-control a {
            display: block; padding: 10px 14px; background: rgba(255, 255, 255, 0.9);
            border-radius: 8px; text-decoration: none; font-weight: 700; color: #14532d;
        }
    </style>
</head>
<body>
    <div id="map"></div>
    <div id="status">Indl&aelig;ser kort&hellip;</div>
    <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
    <script>
        'use strict';

        var RECORD = __RECORD_JSON__;

        var map = null;
        var overlays = [];
        var pointMarkers = [];
        var routeLine = null;
        var activeIds = new Set();
        var layersById = {};
        var viewEpoch = 0;
        var overlayEpoch = 0;

        function api(pathSuffix) {
            return '/api/sites/' + encodeURIComponent(RECORD) + '/' + pathSuffix;
        }

        function showStatus(text, contactEmail) {
            var el = document.getElementById('status');
            el.className = contactEmail ? 'unavailable' : '';
            el.textContent = '';
            var msg = document.createElement('div');
            msg.textContent = text;
            el.appendChild(msg);
            if (contactEmail) {
                var contact = document.createElement('div');
                contact.className = 'contact';
                contact.textContent = 'Kontakt ' + contactEmail + ' for at f\u00e5 et nyt link.';
                msg.appendChild(contact);
            }
        }

        function hideStatus() {
            document.getElementById('status').className = 'hidden';
        }

        async function loadView() {
            var epoch = ++viewEpoch;
            showStatus('Indl\u00e6ser kort\u2026');
            try {
                var res = await fetch(api('view'));
                if (epoch !== viewEpoch) { return; }
                if (res.status === 410) {
                    var body = await res.json();
                    showStatus('Dette kortlink er ikke l\u00e6ngere aktivt.', body.contact_email);
                    return;
                }
                if (!res.ok) {
                    showStatus('Kortet kunne ikke hentes. Pr\u00f8v igen senere.');
                    return;
                }
                var view = await res.json();
                if (epoch !== viewEpoch) { return; }
                renderMap(view);
            } catch (err) {
                if (epoch === viewEpoch) {
                    showStatus('Kortet kunne ikke hentes. Pr\u00f8v igen senere.');
                }
            }
        }

        function renderMap(view) {
            hideStatus();

            activeIds = new Set(view.active);
            layersById = {};
            view.layers.forEach(function (layer) { layersById[layer.id] = layer; });

            map = L.map('map');
            L.tileLayer(view.base_map.url_template, {
                attribution: view.base_map.attribution,
                maxZoom: view.base_map.max_zoom
            }).addTo(map);
            map.fitBounds([
                [view.extent.south_west.lat, view.extent.south_west.lon],
                [view.extent.north_east.lat, view.extent.north_east.lon]
            ]);

            addSiteInfo(view.site);
            addLogo();
            buildPanel(view.layers);
            syncOverlays();
            syncPoints();
        }

        function addSiteInfo(site) {
            if (!site.working_site_name && !site.updated_at) { return; }
            var box = document.createElement('div');
            box.id = 'site-info';
            if (site.working_site_name) {
                var name = document.createElement('div');
                name.className = 'name';
                name.textContent = site.working_site_name;
                box.appendChild(name);
            }
            if (site.updated_at) {
                var updated = document.createElement('div');
                updated.className = 'updated';
                updated.textContent = 'Opdateret ' + new Date(site.updated_at).toLocaleString('da-DK');
                box.appendChild(updated);
            }
            document.body.appendChild(box);
        }

        function addLogo() {
            var LogoControl = L.Control.extend({
                options: { position: 'bottomleft' },
                onAdd: function () {
                    var container = L.DomUtil.create('div', 'logo-control');
                    var link = document.createElement('a');
                    link.href = 'https://www.dalgas.com';
                    link.target = '_blank';
                    link.rel = 'noopener noreferrer';
                    link.textContent = 'Dalgas';
                    container.appendChild(link);
                    L.DomEvent.disableClickPropagation(container);
                    return container;
                }
            });
            map.addControl(new LogoControl());
        }

        function buildPanel(layers) {
            var panel = document.createElement('div');
            panel.id = 'panel';
            var heading = document.createElement('h3');
            heading.textContent = 'Lag';
            panel.appendChild(heading);

            layers.forEach(function (layer) {
                var label = document.createElement('label');
                var box = document.createElement('input');
                box.type = 'checkbox';
                box.dataset.layerId = layer.id;
                box.checked = activeIds.has(layer.id);
                box.addEventListener('change', function () { toggleLayer(layer.id); });
                var title = document.createElement('span');
                title.textContent = layer.title;
                label.appendChild(box);
                label.appendChild(title);
                panel.appendChild(label);
                if (layer.legend) {
                    panel.appendChild(legendBlock(layer.legend));
                }
            });

            var navigate = document.createElement('button');
            navigate.id = 'navigate';
            navigate.textContent = 'Naviger til stakke';
            navigate.addEventListener('click', startNavigation);
            panel.appendChild(navigate);

            document.body.appendChild(panel);
        }

        function legendBlock(legend) {
            var block = document.createElement('div');
            block.className = 'legend';
            var title = document.createElement('div');
            title.className = 'title';
            title.textContent = legend.title;
            block.appendChild(title);
            legend.entries.forEach(function (entry) {
                var row = document.createElement('div');
                row.className = 'entry';
                var swatch = document.createElement('span');
                swatch.className = 'swatch ' + entry.swatch;
                swatch.style.background = entry.color;
                var text = document.createElement('span');
                text.textContent = entry.label;
                row.appendChild(swatch);
                row.appendChild(text);
                block.appendChild(row);
            });
            return block;
        }

        // Grouped layers toggle as one unit; the checkboxes follow.
        function toggleLayer(id) {
            var layer = layersById[id];
            var members = [id];
            if (layer && layer.group) {
                members = Object.values(layersById)
                    .filter(function (l) { return l.group === layer.group; })
                    .map(function (l) { return l.id; });
            }
            var anyActive = members.some(function (m) { return activeIds.has(m); });
            members.forEach(function (m) {
                if (anyActive) { activeIds.delete(m); } else { activeIds.add(m); }
            });
            document.querySelectorAll('#panel input[type=checkbox]').forEach(function (box) {
                box.checked = activeIds.has(box.dataset.layerId);
            });
            syncOverlays();
            syncPoints();
        }

        async function syncOverlays() {
            var epoch = ++overlayEpoch;
            var query = Array.from(activeIds).join(',');
            try {
                var res = await fetch(api('layers') + '?active=' + encodeURIComponent(query));
                if (!res.ok || epoch !== overlayEpoch) { return; }
                var layers = await res.json();
                if (epoch !== overlayEpoch) { return; }

                overlays.forEach(function (overlay) { map.removeLayer(overlay); });
                overlays = layers.map(function (layer) {
                    var params = { zIndex: layer.draw_order };
                    layer.params.forEach(function (pair) {
                        params[pair[0].toLowerCase()] = pair[1];
                    });
                    return L.tileLayer.wms(layer.endpoint, params).addTo(map);
                });
            } catch (err) {
                // Overlay refresh failures keep the previous overlays on screen.
            }
        }

        var cachedPoints = null;

        async function syncPoints() {
            var wantPoints = Array.from(activeIds).some(function (id) {
                var layer = layersById[id];
                return layer && layer.has_points;
            });
            if (!wantPoints) {
                pointMarkers.forEach(function (marker) { map.removeLayer(marker); });
                pointMarkers = [];
                return;
            }
            if (cachedPoints === null) {
                try {
                    var res = await fetch(api('points'));
                    cachedPoints = res.ok ? await res.json() : [];
                } catch (err) {
                    cachedPoints = [];
                }
            }
            if (pointMarkers.length > 0) { return; }
            pointMarkers = cachedPoints.map(function (point) {
                return L.circleMarker([point.position.lat, point.position.lon], {
                    radius: 5, weight: 2, color: '#1f2937', fillColor: '#fff', fillOpacity: 0.9
                })
                    .bindTooltip(point.label, { permanent: true, direction: 'top', offset: [0, -6] })
                    .addTo(map);
            });
        }

        function startNavigation() {
            if (!navigator.geolocation) { return; }
            navigator.geolocation.getCurrentPosition(async function (position) {
                var query = 'lat=' + position.coords.latitude + '&lon=' + position.coords.longitude;
                try {
                    var res = await fetch(api('route') + '?' + query);
                    if (!res.ok) { return; }
                    var body = await res.json();
                    if (routeLine) { map.removeLayer(routeLine); }
                    routeLine = L.polyline(
                        body.route.path.map(function (p) { return [p.lat, p.lon]; }),
                        { color: '#2563eb', weight: 3, dashArray: '6 6' }
                    ).addTo(map);
                    if (body.navigation_url) {
                        window.open(body.navigation_url, '_blank', 'noopener,noreferrer');
                    }
                } catch (err) {
                    // Navigation is optional; ignore failures.
                }
            });
        }

        loadView();
    </script>
</body>
</html>"##;

// ============================================================================
// Handlers
// ============================================================================

/// GET / - Landing page for requests without a record
pub async fn root_page_handler() -> Html<&'static str> {
    Html(ROOT_HTML)
}

/// GET /:record - The embedded viewer for one worksite record
#[instrument]
pub async fn viewer_page_handler(Path(record): Path<String>) -> Response {
    match RecordRef::parse(&record) {
        Ok(record) => Html(render_viewer(&record)).into_response(),
        Err(_) => Html(ROOT_HTML).into_response(),
    }
}

fn render_viewer(record: &RecordRef) -> String {
    let record_json = serde_json::to_string(&record.as_segment())
        .unwrap_or_else(|_| "\"\"".to_string())
        // Angle brackets must not appear inside the inline script tag.
        .replace('<', "\\u003c")
        .replace('>', "\\u003e");
    VIEWER_HTML.replace("__RECORD_JSON__", &record_json)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewer_injects_record_as_json() {
        let record = RecordRef::parse("ABC123").unwrap();
        let html = render_viewer(&record);
        assert!(html.contains("var RECORD = \"ABC123\";"));
        assert!(!html.contains("__RECORD_JSON__"));
    }

    #[test]
    fn test_viewer_escapes_markup_in_record() {
        let record = RecordRef::parse("x</script>").unwrap();
        let html = render_viewer(&record);
        assert!(!html.contains("</script><"));
        assert!(html.contains("\\u003c/script\\u003e"));
    }

    #[test]
    fn test_viewer_page_has_layer_panel_and_states() {
        assert!(VIEWER_HTML.contains("'Lag'"));
        assert!(VIEWER_HTML.contains("ikke l\\u00e6ngere aktivt"));
        assert!(VIEWER_HTML.contains("unpkg.com/leaflet"));
        assert!(VIEWER_HTML.contains("https://www.dalgas.com"));
    }

    #[test]
    fn test_root_page_text() {
        assert!(ROOT_HTML.contains("Applikationen skal &aring;bnes fra tildelt link"));
    }
}
