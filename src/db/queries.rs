pub const SELECT_DEVICE: &str = r#"
SELECT device_id, user_id, name, last_pinged FROM devices WHERE device_id = $1;
"#;

pub const UPDATE_DEVICE_LAST_PINGED: &str = r#"
UPDATE devices SET last_pinged = $2 WHERE device_id = $1;
"#;

pub const SELECT_LOCATIONS_IN_BOX: &str = r#"
SELECT location_id, latitude, longitude, accuracy
FROM locations
WHERE latitude BETWEEN $1 AND $2
  AND longitude BETWEEN $3 AND $4;
"#;

pub const INSERT_LOCATION: &str = r#"
INSERT INTO locations (location_id, latitude, longitude, accuracy)
VALUES ($1, $2, $3, $4)
RETURNING location_id, latitude, longitude, accuracy;
"#;

pub const INSERT_SIGNAL_READING: &str = r#"
INSERT INTO cellular_signal_readings (
    reading_id, carrier, network_generation, signal_level, signal_dbm,
    asu_level, mcc, mnc, recorded_at
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
RETURNING reading_id, carrier, network_generation, signal_level, signal_dbm,
          asu_level, mcc, mnc, recorded_at;
"#;

pub const INSERT_SAMPLE: &str = r#"
INSERT INTO connectivity_samples (
    sample_id, device_id, connectivity_type, connected, ip, ssid, bssid,
    location_id, signal_reading_id, recorded_at
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
RETURNING sample_id, device_id, connectivity_type, connected, ip, ssid, bssid,
          location_id, signal_reading_id, recorded_at;
"#;

pub const SELECT_READINGS_AT_LOCATION: &str = r#"
SELECT r.reading_id, r.carrier, r.network_generation, r.signal_level,
       r.signal_dbm, r.asu_level, r.mcc, r.mnc, r.recorded_at
FROM cellular_signal_readings r
JOIN connectivity_samples s ON s.signal_reading_id = r.reading_id
WHERE s.location_id = $1;
"#;

pub const INSERT_ALERT: &str = r#"
INSERT INTO alerts (
    alert_id, user_id, device_id, sample_id, alert_type, message,
    status, mechanism, created_at
) VALUES ($1, $2, $3, $4, $5, $6, 'pending', $7, $8)
RETURNING alert_id, user_id, device_id, sample_id, alert_type, message,
          status, mechanism, resolved_at, created_at;
"#;

// The PENDING guard is part of the statement so two concurrent resolutions
// cannot both return a row.
pub const RESOLVE_ALERT: &str = r#"
UPDATE alerts
SET status = $3,
    resolved_at = $4
WHERE alert_id = $1
  AND user_id = $2
  AND status = 'pending'
RETURNING alert_id, user_id, device_id, sample_id, alert_type, message,
          status, mechanism, resolved_at, created_at;
"#;

pub const SELECT_ALERT_OWNED: &str = r#"
SELECT 1 AS present FROM alerts WHERE alert_id = $1 AND user_id = $2;
"#;

pub const SELECT_ALERT_MODE: &str = r#"
SELECT user_id, key FROM alert_mode_configs WHERE user_id = $1;
"#;

// Ordered by creation time so "first" matches insertion order; contact_id
// is a v4 uuid and would give an arbitrary row.
pub const SELECT_FIRST_EMERGENCY_CONTACT: &str = r#"
SELECT contact_id, user_id, name, phone, email, contact_type
FROM contacts
WHERE user_id = $1 AND contact_type = 'emergency'
ORDER BY created_at
LIMIT 1;
"#;

pub const SELECT_USER_EMAIL: &str = r#"
SELECT email FROM users WHERE user_id = $1;
"#;
