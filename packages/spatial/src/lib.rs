#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory spatial indexes for map interaction.
//!
//! [`ZipAreaIndex`] answers "which postal region was clicked" with an R-tree
//! of region envelopes followed by an exact point-in-polygon test.
//! [`RecordIndex`] answers "which sale is nearest to the click" over the
//! currently filtered records.

use fyn_housing_sales_models::{GeoPoint, SaleRecord, ZipArea};
use geo::{BoundingRect, Centroid, Contains, MultiPolygon};
use rstar::primitives::GeomWithData;
use rstar::{AABB, RTree, RTreeObject};

/// A region polygon stored in the R-tree with its zip code.
struct AreaEntry {
    id: u32,
    zip_code: u32,
    envelope: AABB<[f64; 2]>,
    polygon: MultiPolygon<f64>,
}

impl RTreeObject for AreaEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Point-in-polygon index over the zip-code regions.
///
/// Built once at startup from the loaded [`ZipArea`]s and shared read-only.
pub struct ZipAreaIndex {
    areas: RTree<AreaEntry>,
}

impl ZipAreaIndex {
    /// Builds the index from the given regions.
    #[must_use]
    pub fn build(areas: &[ZipArea]) -> Self {
        let entries: Vec<AreaEntry> = areas
            .iter()
            .map(|area| AreaEntry {
                id: area.id,
                zip_code: area.zip_code,
                envelope: compute_envelope(&area.geometry),
                polygon: area.geometry.clone(),
            })
            .collect();

        log::debug!("Indexed {} zip areas", entries.len());

        Self {
            areas: RTree::bulk_load(entries),
        }
    }

    /// Look up the zip code of the region containing `point`.
    ///
    /// Postal regions tile the map without overlap, so the first match
    /// wins. Ties on shared borders resolve to the lowest area id.
    #[must_use]
    pub fn lookup_zip(&self, point: GeoPoint) -> Option<u32> {
        let query = geo::Point::new(point.longitude, point.latitude);
        let query_env = AABB::from_point([point.longitude, point.latitude]);

        self.areas
            .locate_in_envelope_intersecting(&query_env)
            .filter(|entry| entry.polygon.contains(&query))
            .min_by_key(|entry| entry.id)
            .map(|entry| entry.zip_code)
    }

    /// Number of indexed regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.areas.size()
    }

    /// Whether no regions are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.areas.size() == 0
    }
}

/// Centroid of a region, used to place labels and as the API's map anchor.
#[must_use]
pub fn area_centroid(area: &ZipArea) -> Option<GeoPoint> {
    area.geometry
        .centroid()
        .map(|c| GeoPoint::new(c.y(), c.x()))
}

/// Nearest-neighbour index over sale locations.
///
/// Longitudes are scaled by the cosine of the mean latitude so that
/// distances are roughly isotropic at the map's latitude.
pub struct RecordIndex {
    tree: RTree<GeomWithData<[f64; 2], usize>>,
    lon_scale: f64,
}

impl RecordIndex {
    /// Indexes every record that has a location. The payload of each entry
    /// is the record's `row`.
    #[must_use]
    pub fn build<'a>(records: impl IntoIterator<Item = &'a SaleRecord>) -> Self {
        let located: Vec<(usize, GeoPoint)> = records
            .into_iter()
            .filter_map(|r| r.location.map(|loc| (r.row, loc)))
            .collect();

        #[allow(clippy::cast_precision_loss)]
        let lon_scale = if located.is_empty() {
            1.0
        } else {
            let mean_lat =
                located.iter().map(|(_, p)| p.latitude).sum::<f64>() / located.len() as f64;
            mean_lat.to_radians().cos().abs().max(f64::EPSILON)
        };

        let entries = located
            .into_iter()
            .map(|(row, p)| GeomWithData::new([p.longitude * lon_scale, p.latitude], row))
            .collect();

        Self {
            tree: RTree::bulk_load(entries),
            lon_scale,
        }
    }

    /// Row of the record nearest to `point`, if any record is indexed.
    #[must_use]
    pub fn nearest_row(&self, point: GeoPoint) -> Option<usize> {
        self.tree
            .nearest_neighbor(&[point.longitude * self.lon_scale, point.latitude])
            .map(|entry| entry.data)
    }
}

/// Converts a `GeoJSON` geometry into a [`MultiPolygon`].
/// Handles both `Polygon` and `MultiPolygon` geometry types.
#[must_use]
pub fn geometry_to_multipolygon(geometry: geojson::Geometry) -> Option<MultiPolygon<f64>> {
    let geo_geom: geo::Geometry<f64> = geometry.try_into().ok()?;
    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        _ => None,
    }
}

/// Compute the bounding box envelope for a [`MultiPolygon`].
fn compute_envelope(mp: &MultiPolygon<f64>) -> AABB<[f64; 2]> {
    mp.bounding_rect().map_or_else(
        || AABB::from_point([0.0, 0.0]),
        |rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
    )
}
