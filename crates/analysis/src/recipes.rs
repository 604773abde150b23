//! Translation of index recipes into service expressions.
//!
//! Source bands are in each dataset's native units. Aggregates are converted
//! to display units (millimetres, degrees Celsius) and day-count thresholds
//! are converted into native units before comparison, so no per-pixel
//! conversion is needed for counts.

use catalog::{Comparison, DatasetDescriptor, IndexRecipe, RequestDescriptor, Variable};
use climate_common::years::year_window;

use crate::error::{AnalysisError, Result};
use crate::expression::{self as ee, Expression};

const DAY_VAR: &str = "_MAPPING_VAR_0_0";
const STATE_VAR: &str = "_MAPPING_VAR_0_1";

/// Expressions for one year of one request.
#[derive(Debug, Clone)]
pub struct YearExpressions {
    pub year: i32,
    /// Source images for the year, filtered to the region and the index variable
    pub collection: Expression,
    /// Per-pixel index image in display units
    pub image: Expression,
}

/// Build the collection and index image for one year of a request.
pub fn year_expressions(
    request: &RequestDescriptor,
    region: &Expression,
    year: i32,
) -> Result<YearExpressions> {
    let dataset = request.dataset();
    let recipe = request.index().recipe();
    let collection = year_collection(dataset, recipe.variable(), region, year)?;
    let image = index_image(dataset, recipe, collection.clone());
    Ok(YearExpressions {
        year,
        collection,
        image,
    })
}

/// Daily images of one variable for a calendar year, restricted to a region.
pub fn year_collection(
    dataset: &DatasetDescriptor,
    variable: Variable,
    region: &Expression,
    year: i32,
) -> Result<Expression> {
    let (start, end) = year_window(year)
        .ok_or_else(|| AnalysisError::NoData(format!("year {} is not a valid date", year)))?;
    let start = start.format("%Y-%m-%d").to_string();
    let end = end.format("%Y-%m-%d").to_string();

    let collection = ee::load_collection(dataset.source_id());
    let collection = ee::filter_date(collection, &start, &end);
    let collection = ee::filter_bounds(collection, region.clone());
    let band = dataset.variable_key(variable).to_string();
    Ok(ee::map_images(collection, |image| ee::select_band(image, &band)))
}

/// Index image for a filtered collection.
pub fn index_image(
    dataset: &DatasetDescriptor,
    recipe: &IndexRecipe,
    collection: Expression,
) -> Expression {
    match *recipe {
        IndexRecipe::Sum { variable } => {
            // Convert first so affine temperature offsets sum correctly
            let converted = ee::map_images(collection, |image| to_display(dataset, variable, image));
            ee::reduce_collection(converted, ee::reducer("sum"))
        }
        IndexRecipe::Max { variable } => to_display(
            dataset,
            variable,
            ee::reduce_collection(collection, ee::reducer("max")),
        ),
        IndexRecipe::Min { variable } => to_display(
            dataset,
            variable,
            ee::reduce_collection(collection, ee::reducer("min")),
        ),
        IndexRecipe::CountDays {
            variable,
            comparison,
            threshold,
        } => {
            let native = to_native(dataset, variable, threshold);
            let flags = ee::map_images(collection, |image| compare(image, comparison, native));
            ee::reduce_collection(flags, ee::reducer("sum"))
        }
        IndexRecipe::LongestSpell {
            variable,
            comparison,
            threshold,
        } => longest_spell(collection, comparison, to_native(dataset, variable, threshold)),
    }
}

/// Convert a threshold in display units into the dataset's native units.
pub fn to_native(dataset: &DatasetDescriptor, variable: Variable, value: f64) -> f64 {
    match variable {
        Variable::Precipitation => value / dataset.precip_scale(),
        Variable::MaxTemperature | Variable::MinTemperature => value - dataset.temp_offset(),
    }
}

fn to_display(dataset: &DatasetDescriptor, variable: Variable, image: Expression) -> Expression {
    match variable {
        Variable::Precipitation if dataset.precip_scale() != 1.0 => ee::binary(
            "Image.multiply",
            image,
            ee::constant_image(dataset.precip_scale()),
        ),
        Variable::MaxTemperature | Variable::MinTemperature if dataset.temp_offset() != 0.0 => {
            ee::binary("Image.add", image, ee::constant_image(dataset.temp_offset()))
        }
        _ => image,
    }
}

fn compare(image: Expression, comparison: Comparison, threshold: f64) -> Expression {
    ee::binary(comparison.service_name(), image, ee::constant_image(threshold))
}

/// Longest run of consecutive days meeting the comparison.
///
/// Iterates over the days carrying a two-band state: the length of the
/// current run and the longest run so far.
fn longest_spell(collection: Expression, comparison: Comparison, threshold: f64) -> Expression {
    let state = Expression::argument(STATE_VAR);
    let hit = compare(Expression::argument(DAY_VAR), comparison, threshold);

    let current = ee::binary(
        "Image.multiply",
        ee::binary(
            "Image.add",
            ee::select_band(state.clone(), "current"),
            ee::constant_image(1.0),
        ),
        hit,
    );
    let longest = ee::binary(
        "Image.max",
        ee::select_band(state, "longest"),
        current.clone(),
    );
    let next = ee::rename_bands(
        Expression::call("Image.addBands", [("dstImg", current), ("srcImg", longest)]),
        &["current", "longest"],
    );

    let first = ee::rename_bands(
        Expression::call("Image.constant", [("value", Expression::constant(vec![0.0, 0.0]))]),
        &["current", "longest"],
    );
    let iterated = Expression::call(
        "Collection.iterate",
        [
            ("collection", collection),
            ("function", Expression::function(&[DAY_VAR, STATE_VAR], next)),
            ("first", first),
        ],
    );
    ee::select_band(iterated, "longest")
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::{DatasetRegistry, IndexCategory, IndexRegistry};
    use climate_common::{BoundingBox, Geometry};

    fn era5() -> DatasetDescriptor {
        DatasetRegistry::with_builtins().get("ERA5").unwrap().clone()
    }

    fn recipe(category: IndexCategory, name: &str) -> IndexRecipe {
        *IndexRegistry::with_builtins()
            .get(category, name)
            .unwrap()
            .recipe()
    }

    fn region() -> Expression {
        ee::geometry(&Geometry::Rectangle(BoundingBox::new(0.0, 40.0, 10.0, 50.0)))
    }

    fn first_call<'a>(expr: &'a Expression, name: &str) -> Option<&'a Expression> {
        match expr {
            Expression::Call {
                function,
                arguments,
            } => {
                if function == name {
                    return Some(expr);
                }
                arguments.values().find_map(|a| first_call(a, name))
            }
            Expression::Function { body, .. } => first_call(body, name),
            Expression::Array(items) => items.iter().find_map(|a| first_call(a, name)),
            Expression::Dictionary(items) => items.values().find_map(|a| first_call(a, name)),
            _ => None,
        }
    }

    fn constant_arg(expr: &Expression, key: &str) -> serde_json::Value {
        match expr {
            Expression::Call { arguments, .. } => match arguments.get(key) {
                Some(Expression::Constant(v)) => v.clone(),
                _ => serde_json::Value::Null,
            },
            _ => serde_json::Value::Null,
        }
    }

    #[test]
    fn test_frost_threshold_in_kelvin() {
        let dataset = era5();
        let collection = year_collection(&dataset, Variable::MinTemperature, &region(), 2015).unwrap();
        let image = index_image(
            &dataset,
            &recipe(IndexCategory::Temperature, "Frost days"),
            collection,
        );

        let lt = first_call(&image, "Image.lt").expect("comparison");
        let threshold = match lt {
            Expression::Call { arguments, .. } => constant_arg(&arguments["image2"], "value"),
            _ => unreachable!(),
        };
        assert!((threshold.as_f64().unwrap() - 273.15).abs() < 1e-9);
    }

    #[test]
    fn test_wet_day_threshold_in_metres() {
        let dataset = era5();
        assert!((to_native(&dataset, Variable::Precipitation, 1.0) - 0.001).abs() < 1e-12);
    }

    #[test]
    fn test_year_window_dates() {
        let collection = year_collection(&era5(), Variable::Precipitation, &region(), 2020).unwrap();
        let range = first_call(&collection, "DateRange").unwrap();
        assert_eq!(constant_arg(range, "start"), "2020-01-01");
        assert_eq!(constant_arg(range, "end"), "2021-01-01");
    }

    #[test]
    fn test_max_temperature_converted_after_reduce() {
        let dataset = era5();
        let collection = year_collection(&dataset, Variable::MaxTemperature, &region(), 2015).unwrap();
        let image = index_image(
            &dataset,
            &recipe(IndexCategory::Temperature, "Annual maximum temperature"),
            collection,
        );
        assert_eq!(image.function_name(), Some("Image.add"));
    }

    #[test]
    fn test_identity_conversion_is_omitted() {
        let prism = DatasetRegistry::with_builtins().get("PRISM").unwrap().clone();
        let collection = year_collection(&prism, Variable::Precipitation, &region(), 2015).unwrap();
        let image = index_image(
            &prism,
            &recipe(IndexCategory::Precipitation, "Annual maximum 1-day precipitation"),
            collection,
        );
        assert_eq!(image.function_name(), Some("ImageCollection.reduce"));
    }

    #[test]
    fn test_consecutive_dry_days_iterates() {
        let dataset = era5();
        let collection = year_collection(&dataset, Variable::Precipitation, &region(), 2015).unwrap();
        let image = index_image(
            &dataset,
            &recipe(IndexCategory::Precipitation, "Consecutive dry days"),
            collection,
        );

        assert_eq!(image.function_name(), Some("Image.select"));
        assert!(first_call(&image, "Collection.iterate").is_some());
        assert!(first_call(&image, "Image.lt").is_some());
    }
}
