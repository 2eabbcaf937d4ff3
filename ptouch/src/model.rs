use std::fmt::{self, Display, Formatter};

/// USB vendor ID of Brother Industries.
pub const VENDOR_ID: u16 = 0x04f9;

/// Supported printer models.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Model {
	PtE550W,
	PtP750W,
	PtP710BT,
}

impl Model {
	pub const ALL: [Self; 3] = [Self::PtE550W, Self::PtP750W, Self::PtP710BT];

	pub fn product_id(self) -> u16 {
		match self {
			Self::PtE550W => 0x2060,
			Self::PtP750W => 0x2062,
			Self::PtP710BT => 0x20af,
		}
	}
}

impl Display for Model {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::PtE550W => "E550W",
			Self::PtP750W => "P750W",
			Self::PtP710BT => "P710BT",
		};

		write!(f, "PT-{name}")
	}
}

impl TryFrom<u16> for Model {
	type Error = String;

	fn try_from(product_id: u16) -> Result<Self, Self::Error> {
		Self::ALL
			.into_iter()
			.find(|m| m.product_id() == product_id)
			.ok_or_else(|| format!("unknown product ID: {product_id:#06x}"))
	}
}

/// A printer found on the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
	pub model: Model,

	/// Tells printers of the same model apart.
	pub serial_number: String,

	pub manufacturer: Option<String>,
	pub product: Option<String>,

	/// Where the device was found, used to open the very same device again.
	pub bus_number: u8,
	pub address: u8,
}

impl DeviceIdentity {
	pub fn vendor_id(&self) -> u16 {
		VENDOR_ID
	}

	pub fn product_id(&self) -> u16 {
		self.model.product_id()
	}
}

impl Display for DeviceIdentity {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let model = self.model.to_string();
		let manufacturer = self.manufacturer.as_deref().unwrap_or("Brother");
		let product = self.product.as_deref().unwrap_or(&model);
		write!(f, "{manufacturer} {product} ({})", self.serial_number)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn product_ids() {
		for model in Model::ALL {
			assert_eq!(Model::try_from(model.product_id()), Ok(model));
		}
		assert_eq!(Model::try_from(0x2062), Ok(Model::PtP750W));
		assert!(Model::try_from(0x2049).is_err());
	}

	#[test]
	fn display() {
		let mut identity = DeviceIdentity {
			model: Model::PtP710BT,
			serial_number: "000G0Z123456".into(),
			manufacturer: None,
			product: None,
			bus_number: 1,
			address: 4,
		};
		assert_eq!(identity.to_string(), "Brother PT-P710BT (000G0Z123456)");

		identity.product = Some("PT-P710BT Label Printer".into());
		assert_eq!(identity.to_string(), "Brother PT-P710BT Label Printer (000G0Z123456)");
	}
}
