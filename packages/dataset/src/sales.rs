//! Sales table reader.
//!
//! Columns are located by header name, so column order does not matter and
//! extra columns are ignored. `zipCode`, `price` and `salesDate` are
//! required; every other column may be absent from the file entirely, in
//! which case the corresponding attribute is unknown for every row.

use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;
use fyn_housing_sales_models::{GeoPoint, PropertyType, SaleRecord};

use crate::coerce::{self, CoerceError};
use crate::{DatasetError, LoadOptions};

const ADDRESS: &str = "address";
const ZIP_CODE: &str = "zipCode";
const TYPE: &str = "type";
const PRICE: &str = "price";
const SALES_DATE: &str = "salesDate";
const SIZE: &str = "size";
const LOT_SIZE: &str = "lotSize";
const ROOMS: &str = "rooms";
const BATHROOMS: &str = "bathrooms";
const BUILD_YEAR: &str = "buildYear";
const LATITUDE: &str = "latitude";
const LONGITUDE: &str = "longitude";

/// Header positions of the known columns.
struct Columns {
    address: Option<usize>,
    zip_code: usize,
    property_type: Option<usize>,
    price: usize,
    sale_date: usize,
    living_area: Option<usize>,
    lot_size: Option<usize>,
    rooms: Option<usize>,
    bathrooms: Option<usize>,
    build_year: Option<usize>,
    latitude: Option<usize>,
    longitude: Option<usize>,
}

impl Columns {
    fn locate(headers: &StringRecord, source: &str) -> Result<Self, DatasetError> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| DatasetError::MissingColumn {
                path: source.to_string(),
                column: name.to_string(),
            })
        };

        Ok(Self {
            address: find(ADDRESS),
            zip_code: require(ZIP_CODE)?,
            property_type: find(TYPE),
            price: require(PRICE)?,
            sale_date: require(SALES_DATE)?,
            living_area: find(SIZE),
            lot_size: find(LOT_SIZE),
            rooms: find(ROOMS),
            bathrooms: find(BATHROOMS),
            build_year: find(BUILD_YEAR),
            latitude: find(LATITUDE),
            longitude: find(LONGITUDE),
        })
    }
}

/// One data row being converted, carrying enough context for errors.
struct RowReader<'a> {
    record: &'a StringRecord,
    source: &'a str,
    row: usize,
}

impl RowReader<'_> {
    fn raw(&self, index: Option<usize>) -> &str {
        index.and_then(|i| self.record.get(i)).unwrap_or("")
    }

    fn fail(&self, column: &str, err: CoerceError, raw: &str) -> DatasetError {
        match err {
            CoerceError::Negative if column == PRICE => DatasetError::NegativePrice {
                path: self.source.to_string(),
                row: self.row,
                value: raw.to_string(),
            },
            CoerceError::Invalid | CoerceError::Negative => DatasetError::InvalidValue {
                path: self.source.to_string(),
                row: self.row,
                column: column.to_string(),
                value: raw.to_string(),
            },
        }
    }

    fn missing(&self, column: &str) -> DatasetError {
        DatasetError::MissingValue {
            path: self.source.to_string(),
            row: self.row,
            column: column.to_string(),
        }
    }

    fn optional<T>(
        &self,
        column: &str,
        index: Option<usize>,
        parse: fn(&str) -> Result<Option<T>, CoerceError>,
    ) -> Result<Option<T>, DatasetError> {
        let raw = self.raw(index);
        parse(raw).map_err(|err| self.fail(column, err, raw))
    }

    fn required<T>(
        &self,
        column: &str,
        index: usize,
        parse: fn(&str) -> Result<Option<T>, CoerceError>,
    ) -> Result<T, DatasetError> {
        self.optional(column, Some(index), parse)?
            .ok_or_else(|| self.missing(column))
    }
}

/// Reads the sales table at `path`.
///
/// # Errors
///
/// * If the file cannot be opened
/// * If any row fails to convert (see [`read_sales`])
pub fn load_sales(path: &Path, options: &LoadOptions) -> Result<Vec<SaleRecord>, DatasetError> {
    let file = crate::open(path)?;
    let records = read_sales(file, &path.display().to_string(), options)?;

    log::info!("Read {} sales from {}", records.len(), path.display());

    Ok(records)
}

/// Reads a sales table from any reader. `source` names the input in error
/// messages.
///
/// # Errors
///
/// * If a required column (`zipCode`, `price`, `salesDate`) is absent
/// * If a required field holds a missing-value sentinel
/// * If a present value does not parse, or a price is negative
pub fn read_sales(
    reader: impl Read,
    source: &str,
    options: &LoadOptions,
) -> Result<Vec<SaleRecord>, DatasetError> {
    let csv_error = |source_err| DatasetError::Csv {
        path: source.to_string(),
        source: source_err,
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter_byte())
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers().map_err(csv_error)?.clone();
    let columns = Columns::locate(&headers, source)?;

    let mut records = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result.map_err(csv_error)?;
        records.push(convert_row(&record, &columns, source, row, options)?);
    }

    Ok(records)
}

fn convert_row(
    record: &StringRecord,
    columns: &Columns,
    source: &str,
    row: usize,
    options: &LoadOptions,
) -> Result<SaleRecord, DatasetError> {
    let reader = RowReader {
        record,
        source,
        row,
    };

    let zip_code = reader.required(ZIP_CODE, columns.zip_code, coerce::count)?;
    let price = reader.required(PRICE, columns.price, coerce::amount)?;
    let sale_date: NaiveDate = reader.required(SALES_DATE, columns.sale_date, coerce::date)?;

    let property_type = coerce::text(reader.raw(columns.property_type))
        .map_or(PropertyType::Other, |t| PropertyType::from_listing_text(&t));

    let bathrooms = reader
        .optional(BATHROOMS, columns.bathrooms, coerce::count)?
        .filter(|&n| n > 0)
        .unwrap_or(options.missing.bathrooms);

    let build_year = reader
        .optional(BUILD_YEAR, columns.build_year, coerce::whole)?
        .map(|year| {
            i32::try_from(year).map_err(|_| {
                reader.fail(
                    BUILD_YEAR,
                    CoerceError::Invalid,
                    reader.raw(columns.build_year),
                )
            })
        })
        .transpose()?;

    let latitude = reader.optional(LATITUDE, columns.latitude, coerce::real)?;
    let longitude = reader.optional(LONGITUDE, columns.longitude, coerce::real)?;
    let location = latitude
        .zip(longitude)
        .map(|(lat, lon)| GeoPoint::new(lat, lon));

    Ok(SaleRecord {
        row,
        address: coerce::text(reader.raw(columns.address)),
        zip_code,
        property_type,
        price,
        living_area: reader.optional(SIZE, columns.living_area, coerce::real)?,
        lot_size: reader.optional(LOT_SIZE, columns.lot_size, coerce::real)?,
        rooms: reader.optional(ROOMS, columns.rooms, coerce::count)?,
        bathrooms: Some(bathrooms),
        build_year,
        sale_date,
        location,
    })
}
