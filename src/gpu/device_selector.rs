use std::cell::OnceCell;
use std::ffi::CStr;

use ash::vk;
#[cfg(feature = "hikari-serde")]
use serde::{Deserialize, Serialize};

use super::driver::Driver;
use super::{GPUError, Result};

/// Queue capability a device must expose to be selected.
pub const REQUIRED_QUEUE_CAPABILITY: vk::QueueFlags = vk::QueueFlags::GRAPHICS;

#[cfg_attr(feature = "hikari-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    Dedicated,
    Integrated,
    #[default]
    Other,
}

impl From<vk::PhysicalDeviceType> for DeviceType {
    fn from(value: vk::PhysicalDeviceType) -> Self {
        match value {
            vk::PhysicalDeviceType::DISCRETE_GPU => DeviceType::Dedicated,
            vk::PhysicalDeviceType::INTEGRATED_GPU => DeviceType::Integrated,
            _ => DeviceType::Other,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct DeviceInfo {
    pub name: String,
    pub kind: DeviceType,
    pub driver_version: u32,
    pub api_version: u32,
}

impl From<vk::PhysicalDeviceProperties> for DeviceInfo {
    fn from(value: vk::PhysicalDeviceProperties) -> Self {
        DeviceInfo {
            // SAFETY: the driver nul-terminates `device_name` within its array.
            name: unsafe { CStr::from_ptr(value.device_name.as_ptr()) }
                .to_str()
                .unwrap_or("UNKNOWN")
                .to_string(),
            kind: value.device_type.into(),
            driver_version: value.driver_version,
            api_version: value.api_version,
        }
    }
}

/// Per-family record of whether the required capability is present, up to
/// and including the first family that has it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QueueFamilyProfile {
    pub scanned: Vec<(u32, bool)>,
    pub qualifying: Option<u32>,
}

impl QueueFamilyProfile {
    pub fn scan(families: &[vk::QueueFlags], required: vk::QueueFlags) -> Self {
        let mut profile = Self::default();
        for (idx, flags) in families.iter().enumerate() {
            let idx = idx as u32;
            let supported = flags.contains(required);
            profile.scanned.push((idx, supported));
            if supported {
                profile.qualifying = Some(idx);
                break;
            }
        }
        profile
    }
}

/// A device as the driver enumerated it. Queue families are fetched on
/// first use and cached.
#[derive(Debug, Clone)]
pub struct DeviceCandidate<P> {
    pub index: usize,
    pub physical: P,
    pub info: DeviceInfo,
    queue_families: OnceCell<Vec<vk::QueueFlags>>,
}

impl<P> DeviceCandidate<P> {
    pub fn new(index: usize, physical: P, info: DeviceInfo) -> Self {
        Self {
            index,
            physical,
            info,
            queue_families: OnceCell::new(),
        }
    }

    pub fn with_queue_families(self, families: Vec<vk::QueueFlags>) -> Self {
        Self {
            queue_families: OnceCell::from(families),
            ..self
        }
    }

    /// `None` until the families have been fetched.
    pub fn queue_families(&self) -> Option<&[vk::QueueFlags]> {
        self.queue_families.get().map(Vec::as_slice)
    }
}

#[derive(Debug, Clone)]
pub struct SelectedDevice<P> {
    pub(crate) device_id: usize,
    pub physical: P,
    pub queue_family: u32,
    pub info: DeviceInfo,
}

impl<P> SelectedDevice<P> {
    /// Position of the device in driver enumeration order.
    pub fn device_id(&self) -> usize {
        self.device_id
    }
}

impl<P> std::fmt::Display for SelectedDevice<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[Name {} -- Driver Ver {} -- ID {}]",
            self.info.name, self.info.driver_version, self.device_id
        )
    }
}

#[cfg_attr(feature = "hikari-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DeviceFilter {
    name: Option<String>,
    kind: Option<DeviceType>,
}

impl DeviceFilter {
    pub fn add_required_name(&mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self.clone()
    }

    pub fn add_required_type(&mut self, kind: DeviceType) -> Self {
        self.kind = Some(kind);
        self.clone()
    }

    fn score(&self, info: &DeviceInfo) -> u32 {
        let mut score = 0;
        if Self::check(&info.name, self.name.as_ref()) {
            score += 1;
        }
        if Self::check(&info.kind, self.kind.as_ref()) {
            score += 1;
        }
        score
    }

    fn check<T: PartialEq>(a: &T, b: Option<&T>) -> bool {
        b.map_or(false, |c| c == a)
    }
}

/// How a device is picked among those with a qualifying queue family.
#[cfg_attr(feature = "hikari-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Default, Clone, PartialEq)]
pub enum SelectionPolicy {
    /// First qualifying device in enumeration order.
    #[default]
    FirstMatch,
    /// Qualifying device matching the most filter fields; ties go to the
    /// lowest enumeration index.
    Prefer(DeviceFilter),
}

type FamilyLoader<'a, P> = Box<dyn Fn(usize, P) -> Vec<vk::QueueFlags> + 'a>;

pub struct DeviceSelector<'a, P> {
    candidates: Vec<DeviceCandidate<P>>,
    loader: Option<FamilyLoader<'a, P>>,
    required: vk::QueueFlags,
}

impl<'a, P: Copy> DeviceSelector<'a, P> {
    /// Enumerate every device the context can see. Queue families are only
    /// asked for while a selection scans the device.
    pub fn enumerate<D>(driver: &'a D, instance: &'a D::Instance) -> Result<Self>
    where
        D: Driver<PhysicalDevice = P> + 'a,
    {
        let physical = driver.physical_devices(instance)?;
        if physical.is_empty() {
            tracing::error!("failed to find GPUs with Vulkan support");
            return Err(GPUError::NoDevicesFound);
        }

        let candidates = physical
            .into_iter()
            .enumerate()
            .map(|(index, device)| {
                let info = driver.device_info(instance, device);
                tracing::debug!("device {} {:?} ({:?})", index, info.name, info.kind);
                DeviceCandidate::new(index, device, info)
            })
            .collect();

        Ok(Self {
            candidates,
            loader: Some(Box::new(move |index, device| {
                let families = driver.queue_family_flags(instance, device);
                tracing::debug!("device {} has {} queue families", index, families.len());
                families
            })),
            required: REQUIRED_QUEUE_CAPABILITY,
        })
    }

    /// Selector over candidates whose queue families are already known.
    /// Candidates without families never qualify.
    pub fn with_candidates(candidates: Vec<DeviceCandidate<P>>) -> Self {
        Self {
            candidates,
            loader: None,
            required: REQUIRED_QUEUE_CAPABILITY,
        }
    }

    pub fn candidates(&self) -> &[DeviceCandidate<P>] {
        &self.candidates
    }

    pub fn select(&self, policy: &SelectionPolicy) -> Result<SelectedDevice<P>> {
        let selected = match policy {
            SelectionPolicy::FirstMatch => self.select_device(),
            SelectionPolicy::Prefer(filter) => self.select_preferred(filter),
        }?;
        tracing::info!("selected device {}", selected);
        Ok(selected)
    }

    /// First device, in enumeration order, with a qualifying queue family.
    pub fn select_device(&self) -> Result<SelectedDevice<P>> {
        self.qualifying()
            .next()
            .map(|(candidate, family)| Self::selected(candidate, family))
            .ok_or(GPUError::NoSuitableDevice)
    }

    pub fn select_preferred(&self, filter: &DeviceFilter) -> Result<SelectedDevice<P>> {
        let mut best: Option<(u32, &DeviceCandidate<P>, u32)> = None;
        for (candidate, family) in self.qualifying() {
            let score = filter.score(&candidate.info);
            if best.map_or(true, |(max_score, _, _)| score > max_score) {
                best = Some((score, candidate, family));
            }
        }

        best.map(|(_, candidate, family)| Self::selected(candidate, family))
            .ok_or(GPUError::NoSuitableDevice)
    }

    pub fn select_by_id(&self, id: usize) -> Result<SelectedDevice<P>> {
        let candidate = self.candidates.get(id).ok_or(GPUError::NoSuitableDevice)?;
        self.profile_queue_families(candidate)
            .qualifying
            .map(|family| Self::selected(candidate, family))
            .ok_or(GPUError::NoSuitableDevice)
    }

    /// Scan the candidate's queue families, fetching them on first use.
    pub fn profile_queue_families(&self, candidate: &DeviceCandidate<P>) -> QueueFamilyProfile {
        let families = candidate.queue_families.get_or_init(|| {
            self.loader
                .as_ref()
                .map_or_else(Vec::new, |load| load(candidate.index, candidate.physical))
        });
        QueueFamilyProfile::scan(families, self.required)
    }

    fn qualifying(&self) -> impl Iterator<Item = (&DeviceCandidate<P>, u32)> + '_ {
        self.candidates.iter().filter_map(move |candidate| {
            let profile = self.profile_queue_families(candidate);
            if profile.qualifying.is_none() {
                tracing::debug!("device {} has no {:?} queue family", candidate.index, self.required);
            }
            profile.qualifying.map(|family| (candidate, family))
        })
    }

    fn selected(candidate: &DeviceCandidate<P>, family: u32) -> SelectedDevice<P> {
        SelectedDevice {
            device_id: candidate.index,
            physical: candidate.physical,
            queue_family: family,
            info: candidate.info.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPUTE: vk::QueueFlags = vk::QueueFlags::COMPUTE;
    const TRANSFER: vk::QueueFlags = vk::QueueFlags::TRANSFER;

    fn gfx() -> vk::QueueFlags {
        vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE
    }

    fn candidate(index: usize, kind: DeviceType, families: Vec<vk::QueueFlags>) -> DeviceCandidate<usize> {
        let info = DeviceInfo {
            name: format!("GPU {}", index),
            kind,
            ..Default::default()
        };
        DeviceCandidate::new(index, index, info).with_queue_families(families)
    }

    #[test]
    fn profile_stops_at_first_qualifying_family() {
        let profile = QueueFamilyProfile::scan(&[TRANSFER, gfx(), gfx()], vk::QueueFlags::GRAPHICS);
        assert_eq!(profile.qualifying, Some(1));
        assert_eq!(profile.scanned, vec![(0, false), (1, true)]);
    }

    #[test]
    fn profile_without_qualifying_family() {
        let profile = QueueFamilyProfile::scan(&[TRANSFER, COMPUTE], vk::QueueFlags::GRAPHICS);
        assert_eq!(profile.qualifying, None);
        assert_eq!(profile.scanned.len(), 2);
    }

    #[test]
    fn picks_only_qualifying_device() {
        let selector = DeviceSelector::with_candidates(vec![
            candidate(0, DeviceType::Dedicated, vec![COMPUTE]),
            candidate(1, DeviceType::Integrated, vec![TRANSFER, COMPUTE]),
            candidate(2, DeviceType::Other, vec![TRANSFER, gfx(), gfx()]),
        ]);
        let selected = selector.select_device().unwrap();
        assert_eq!(selected.device_id(), 2);
        assert_eq!(selected.physical, 2);
        assert_eq!(selected.queue_family, 1);
    }

    #[test]
    fn first_match_ignores_device_type() {
        let selector = DeviceSelector::with_candidates(vec![
            candidate(0, DeviceType::Integrated, vec![gfx()]),
            candidate(1, DeviceType::Dedicated, vec![gfx()]),
        ]);
        for _ in 0..3 {
            assert_eq!(selector.select_device().unwrap().device_id(), 0);
        }
    }

    #[test]
    fn no_qualifying_device_fails() {
        let selector = DeviceSelector::with_candidates(vec![candidate(0, DeviceType::Dedicated, vec![COMPUTE])]);
        assert!(matches!(selector.select_device(), Err(GPUError::NoSuitableDevice)));
        assert!(matches!(
            selector.select(&SelectionPolicy::Prefer(DeviceFilter::default())),
            Err(GPUError::NoSuitableDevice)
        ));
    }

    #[test]
    fn prefer_policy_scores_matching_fields() {
        let selector = DeviceSelector::with_candidates(vec![
            candidate(0, DeviceType::Integrated, vec![gfx()]),
            candidate(1, DeviceType::Dedicated, vec![COMPUTE]),
            candidate(2, DeviceType::Dedicated, vec![gfx()]),
        ]);
        let filter = DeviceFilter::default().add_required_type(DeviceType::Dedicated);
        let selected = selector.select(&SelectionPolicy::Prefer(filter)).unwrap();
        assert_eq!(selected.device_id(), 2);

        let filter = DeviceFilter::default()
            .add_required_type(DeviceType::Dedicated)
            .add_required_name("GPU 0");
        let selected = selector.select(&SelectionPolicy::Prefer(filter)).unwrap();
        assert_eq!(selected.device_id(), 0);
    }

    #[test]
    fn prefer_policy_ties_go_to_lowest_index() {
        let selector = DeviceSelector::with_candidates(vec![
            candidate(0, DeviceType::Other, vec![COMPUTE]),
            candidate(1, DeviceType::Other, vec![gfx()]),
            candidate(2, DeviceType::Other, vec![gfx()]),
        ]);
        let selected = selector.select_preferred(&DeviceFilter::default()).unwrap();
        assert_eq!(selected.device_id(), 1);
    }

    #[test]
    fn select_by_id_requires_qualifying_family() {
        let selector = DeviceSelector::with_candidates(vec![
            candidate(0, DeviceType::Other, vec![COMPUTE]),
            candidate(1, DeviceType::Other, vec![TRANSFER, gfx()]),
        ]);
        assert!(selector.select_by_id(0).is_err());
        assert!(selector.select_by_id(5).is_err());
        assert_eq!(selector.select_by_id(1).unwrap().queue_family, 1);
    }

    #[test]
    fn candidate_without_families_never_qualifies() {
        let bare = DeviceCandidate::new(0, 0, DeviceInfo::default());
        assert!(bare.queue_families().is_none());

        let selector = DeviceSelector::with_candidates(vec![bare, candidate(1, DeviceType::Other, vec![gfx()])]);
        assert_eq!(selector.select_device().unwrap().device_id(), 1);
        assert_eq!(selector.candidates()[0].queue_families(), Some(&[][..]));
    }

    #[test]
    fn device_type_from_vk() {
        assert_eq!(DeviceType::from(vk::PhysicalDeviceType::DISCRETE_GPU), DeviceType::Dedicated);
        assert_eq!(DeviceType::from(vk::PhysicalDeviceType::INTEGRATED_GPU), DeviceType::Integrated);
        assert_eq!(DeviceType::from(vk::PhysicalDeviceType::CPU), DeviceType::Other);
    }

    #[test]
    fn selected_device_display() {
        let selected = SelectedDevice {
            device_id: 3,
            physical: (),
            queue_family: 0,
            info: DeviceInfo {
                name: "Test GPU".to_string(),
                driver_version: 42,
                ..Default::default()
            },
        };
        assert_eq!(selected.to_string(), "[Name Test GPU -- Driver Ver 42 -- ID 3]");
    }
}
