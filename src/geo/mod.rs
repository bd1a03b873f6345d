use crate::models::courier::LatLng;

/// Address text used when a customer fills the address from a position read.
pub fn gps_address(position: LatLng) -> String {
    format!("Ubicación GPS: {:.6}, {:.6}", position.lat, position.lng)
}

#[cfg(test)]
mod tests {
    use super::gps_address;
    use crate::models::courier::LatLng;

    #[test]
    fn formats_six_decimals() {
        let address = gps_address(LatLng {
            lat: 18.4861,
            lng: -69.93121234,
        });
        assert_eq!(address, "Ubicación GPS: 18.486100, -69.931212");
    }
}
