use std::time::Duration;

use rusb::{Direction, GlobalContext, TransferType};

use crate::{
	error::{Error, Result, TransportError},
	model::{DeviceIdentity, Model, VENDOR_ID},
	Backend,
};

pub type Device = rusb::Device<GlobalContext>;
pub type DeviceHandle = rusb::DeviceHandle<GlobalContext>;

/// Look at a device and tell whether it is a printer we support.
fn identify(dev: &Device) -> Option<DeviceIdentity> {
	let Ok(dd) = dev.device_descriptor() else {
		log::error!("cannot get device descriptor for device {dev:?}");
		return None;
	};

	if dd.vendor_id() != VENDOR_ID {
		return None;
	}

	let model = match Model::try_from(dd.product_id()) {
		Ok(model) => model,
		Err(e) => {
			log::debug!("skipping Brother device: {e}");
			return None;
		},
	};

	// The serial number can only be read from an open device.
	let handle = match dev.open() {
		Ok(handle) => handle,
		Err(e) => {
			log::warn!("found a {model}, but cannot open it: {e}");
			return None;
		},
	};

	let serial_number = match handle.read_serial_number_string_ascii(&dd) {
		Ok(s) => s,
		Err(e) => {
			log::warn!("found a {model}, but cannot read its serial number: {e}");
			return None;
		},
	};

	Some(DeviceIdentity {
		model,
		serial_number,
		manufacturer: handle.read_manufacturer_string_ascii(&dd).ok(),
		product: handle.read_product_string_ascii(&dd).ok(),
		bus_number: dev.bus_number(),
		address: dev.address(),
	})
}

/// Get a list of supported printers connected via usb.
///
/// If `serial` is given, only the printer with that serial number is returned.
pub fn discover(serial: Option<&str>) -> Result<Vec<DeviceIdentity>, TransportError> {
	let found = rusb::devices()?
		.iter()
		.filter_map(|dev| identify(&dev))
		.filter(|id| serial.map_or(true, |s| s == id.serial_number))
		.inspect(|id| log::info!("found {id} on bus {:03} address {:03}", id.bus_number, id.address))
		.collect();

	Ok(found)
}

/// Find the bulk endpoints of the printer interface: `(interface, in, out, max packet size)`.
fn select_interface(dev: &Device) -> Result<(u8, u8, u8, usize)> {
	let cd = dev.active_config_descriptor()?;
	log::debug!("USB configuration descriptor: {cd:#?}");

	let int = cd.interfaces().next().ok_or(Error::NoDriver)?;
	let id = int.descriptors().next().ok_or(Error::NoDriver)?;
	log::debug!("USB interface descriptor: {id:#?}");

	let (mut epin, mut epout) = (None, None);
	for epd in id
		.endpoint_descriptors()
		.filter(|epd| epd.transfer_type() == TransferType::Bulk)
	{
		match epd.direction() {
			Direction::In => epin = Some(epd.address()),
			Direction::Out => epout = Some((epd.address(), epd.max_packet_size() as usize)),
		}
	}

	match (epin, epout) {
		(Some(epin), Some((epout, max_packet))) => Ok((int.number(), epin, epout, max_packet.max(1))),
		_ => Err(Error::NoDriver),
	}
}

/// A USB backend for [`Session`](crate::Session).
pub struct UsbBackend {
	handle: DeviceHandle,
	interface: u8,
	epin: u8,
	epout: u8,
	max_packet: usize,
}

impl UsbBackend {
	/// Open the printer described by `identity`.
	///
	/// Fails with [`Error::NoDriver`] if it is gone, or if another device took its place.
	pub fn open(identity: &DeviceIdentity) -> Result<Self> {
		let dev = rusb::devices()?
			.iter()
			.find(|dev| dev.bus_number() == identity.bus_number && dev.address() == identity.address)
			.ok_or(Error::NoDriver)?;

		let dd = dev.device_descriptor()?;
		if dd.vendor_id() != VENDOR_ID || dd.product_id() != identity.product_id() {
			return Err(Error::NoDriver);
		}

		let handle = dev.open()?;

		// automatically steal the USB device from the kernel
		let _ = handle.set_auto_detach_kernel_driver(true);

		if handle.read_serial_number_string_ascii(&dd)? != identity.serial_number {
			return Err(Error::NoDriver);
		}

		let (interface, epin, epout, max_packet) = select_interface(&dev)?;
		handle.claim_interface(interface)?;
		log::debug!("claimed interface {interface} of {identity}, endpoints in={epin:#04x} out={epout:#04x}");

		Ok(Self {
			handle,
			interface,
			epin,
			epout,
			max_packet,
		})
	}
}

impl Backend for UsbBackend {
	fn send(&mut self, buf: &[u8], timeout: Duration) -> Result<usize, TransportError> {
		let chunk = &buf[..buf.len().min(self.max_packet)];
		Ok(self.handle.write_bulk(self.epout, chunk, timeout)?)
	}

	fn recv(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, TransportError> {
		Ok(self.handle.read_bulk(self.epin, buf, timeout)?)
	}
}

impl Drop for UsbBackend {
	fn drop(&mut self) {
		let _ = self.handle.release_interface(self.interface);
	}
}
