use egui::Pos2;

pub mod hit_testing;
pub mod mapper;

/// Distance from a point to the line segment `start..end`
pub fn distance_to_segment(point: Pos2, start: Pos2, end: Pos2) -> f32 {
    let segment = end - start;
    let length_sq = segment.length_sq();
    if length_sq == 0.0 {
        return point.distance(start);
    }

    let t = ((point - start).dot(segment) / length_sq).clamp(0.0, 1.0);
    point.distance(start + segment * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    #[test]
    fn test_distance_to_segment() {
        let start = pos2(0.0, 0.0);
        let end = pos2(10.0, 0.0);

        assert_eq!(distance_to_segment(pos2(5.0, 3.0), start, end), 3.0);
        // Beyond the end the distance is measured to the endpoint
        assert_eq!(distance_to_segment(pos2(13.0, 4.0), start, end), 5.0);
        // Degenerate segment
        assert_eq!(distance_to_segment(pos2(3.0, 4.0), start, start), 5.0);
    }
}
