use serde_json::Value;

use crate::error::AnalysisError;
use crate::model::RawPart;

/// Parse an analyzer response body into raw parts, in analyzer order.
pub fn parse_analysis(body: &str) -> Result<Vec<RawPart>, AnalysisError> {
    let value: Value = serde_json::from_str(body)?;
    parse_analysis_value(value)
}

pub fn parse_analysis_value(value: Value) -> Result<Vec<RawPart>, AnalysisError> {
    let Value::Array(items) = value else {
        return Err(AnalysisError::NotAList);
    };
    let parts = items
        .into_iter()
        .map(serde_json::from_value::<RawPart>)
        .collect::<Result<Vec<_>, _>>()?;
    for (index, p) in parts.iter().enumerate() {
        check_geometry(index, p)?;
    }
    Ok(parts)
}

pub(crate) fn check_geometry(index: usize, p: &RawPart) -> Result<(), AnalysisError> {
    let dims = [p.width, p.height];
    let corners = [p.minx, p.miny, p.maxx, p.maxy];
    if dims.iter().chain(corners.iter()).any(|v| !v.is_finite()) {
        return Err(AnalysisError::InvalidGeometry {
            index,
            reason: "non-finite coordinate".into(),
        });
    }
    if p.width < 0.0 || p.height < 0.0 {
        return Err(AnalysisError::InvalidGeometry {
            index,
            reason: format!("negative size {}x{}", p.width, p.height),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_svg_style_output() {
        let body = r#"[
            {"type":"SVG","minx":0,"miny":0,"maxx":49.6,"maxy":50.2,"width":49.6,"height":50.2,
             "area":2489.92,"description":"","preview":"data:,","preview_global":"data:,"},
            {"type":"SVG","minx":60,"miny":0,"maxx":160,"maxy":200,"width":100,"height":200,
             "area":20000,"description":"","preview":"data:,","preview_global":"data:,"}
        ]"#;
        let parts = parse_analysis(body).unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1].minx, 60.0);
        assert_eq!(parts[0].width, 49.6);
    }

    #[test]
    fn non_list_is_rejected() {
        let err = parse_analysis(r#"{"error":"Python JSON parse failed"}"#).unwrap_err();
        assert!(matches!(err, AnalysisError::NotAList));
        assert!(matches!(parse_analysis("not json"), Err(AnalysisError::Json(_))));
    }

    #[test]
    fn bad_elements_are_rejected() {
        assert!(matches!(
            parse_analysis(r#"[{"height": 3}]"#),
            Err(AnalysisError::Json(_))
        ));
        assert!(matches!(
            parse_analysis(r#"[{"width": 3, "height": -1}]"#),
            Err(AnalysisError::InvalidGeometry { index: 0, .. })
        ));
    }
}
