//! Representative GIOŚ API payloads, trimmed from real responses.
//!
//! Coordinates arrive as strings on `findAll`; `parse_stations` has to
//! accept both strings and numbers.

pub fn fixture_stations_json() -> &'static str {
    r#"[
  {
    "id": 114,
    "stationName": "Wrocław - Bartnicza",
    "gegrLat": "51.115933",
    "gegrLon": "17.141125",
    "city": {
      "id": 1064,
      "name": "Wrocław",
      "commune": {
        "communeName": "Wrocław",
        "districtName": "Wrocław",
        "provinceName": "DOLNOŚLĄSKIE"
      }
    },
    "addressStreet": "ul. Bartnicza"
  },
  {
    "id": 117,
    "stationName": "Wrocław - Korzeniowskiego",
    "gegrLat": 51.129378,
    "gegrLon": 17.02925,
    "city": {
      "id": 1064,
      "name": "Wrocław",
      "commune": {
        "communeName": "Wrocław",
        "districtName": "Wrocław",
        "provinceName": "DOLNOŚLĄSKIE"
      }
    },
    "addressStreet": "ul. Wyb. J. Conrada-Korzeniowskiego 18"
  },
  {
    "id": 400,
    "stationName": "Kraków, Aleja Krasińskiego",
    "gegrLat": "50.057678",
    "gegrLon": "19.926189",
    "city": {
      "id": 415,
      "name": "Kraków",
      "commune": {
        "communeName": "Kraków",
        "districtName": "Kraków",
        "provinceName": "MAŁOPOLSKIE"
      }
    },
    "addressStreet": null
  }
]"#
}

pub fn fixture_sensors_json() -> &'static str {
    r#"[
  {
    "id": 92,
    "stationId": 14,
    "param": {
      "paramName": "pył zawieszony PM10",
      "paramFormula": "PM10",
      "paramCode": "PM10",
      "idParam": 3
    }
  },
  {
    "id": 88,
    "stationId": 14,
    "param": {
      "paramName": "dwutlenek azotu",
      "paramFormula": "NO2",
      "paramCode": "NO2",
      "idParam": 6
    }
  }
]"#
}

/// Three hourly PM10 slots, the newest not yet reported (`null`).
pub fn fixture_measurements_json() -> &'static str {
    r#"{
  "key": "PM10",
  "values": [
    { "date": "2024-03-01 12:00:00", "value": null },
    { "date": "2024-03-01 11:00:00", "value": 31.4512 },
    { "date": "2024-03-01 10:00:00", "value": 27.1 }
  ]
}"#
}
